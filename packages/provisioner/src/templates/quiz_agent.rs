//! Quiz agent: writes quizzes from the contents of an uploaded data set

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::assets::{fill_prompt, prompts};
use super::{
    prepare_knowledge, AgentPlacement, DeployedAgent, DeploymentReport, KnowledgePlan,
    KnowledgeSource, Template,
};
use crate::config::settings::pause;
use crate::platform::Platform;
use crate::provision::agents::AgentProvisioner;
use crate::provision::knowledge::IndexPolicy;

pub const NAME: &str = "quiz-agent";
pub const DEFAULT_AGENT_NAME: &str = "Quiz Agent";

const DESCRIPTION: &str = "Creates quizzes and study material from a knowledge base";

const PLAN: KnowledgePlan = KnowledgePlan {
    policy: IndexPolicy::ExistingDatabaseOnly,
    wait_for_new_database: true,
    keep_generated_key: false,
};

#[derive(Clone)]
pub struct QuizAgent {
    pub placement: AgentPlacement,
    pub knowledge: KnowledgeSource,
    /// Short description of the uploaded data, given to the agent
    pub data_description: String,
    pub agent_name: String,
}

#[async_trait]
impl Template for QuizAgent {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = self.placement.describe();
        fields.extend(self.knowledge.describe());
        fields.push(("data description", self.data_description.clone()));
        fields.push(("agent name", self.agent_name.clone()));
        fields
    }

    async fn deploy(&self, platform: &Platform) -> Result<DeploymentReport> {
        let prepared = prepare_knowledge(platform, &self.placement, &self.knowledge, PLAN).await?;
        let kb_uuid = prepared.knowledge_base.uuid.clone();

        let instruction = fill_prompt(
            prompts::QUIZ_AGENT,
            &[("data_description", self.data_description.as_str())],
        );
        let agents = AgentProvisioner::new(platform);
        let config = self.placement.agent_config(
            &self.agent_name,
            DESCRIPTION,
            &instruction,
            Some(vec![kb_uuid.clone()]),
        );
        let agent_uuid = agents.create(&config).await?;

        info!("Waiting for the agent before updating retrieval settings");
        pause(platform.pacing.agent_settle()).await;
        agents.update_retrieval(&agent_uuid).await?;

        let mut report = DeploymentReport::new(NAME);
        report.agents.push(DeployedAgent::new("quiz", &agent_uuid));
        report.knowledge_base = Some(kb_uuid);
        report.bucket = Some(self.knowledge.bucket_name.clone());
        Ok(report)
    }
}
