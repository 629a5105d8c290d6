//! Logs assistant: an agent that reads App Platform logs through a function

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::assets::{prompts, tool_spec, tools};
use super::{AgentPlacement, DeployedAgent, DeploymentReport, Template};
use crate::config::env::mask_token;
use crate::platform::Platform;
use crate::provision::agents::{AgentProvisioner, ToolBinding};
use crate::provision::functions::FunctionDeployer;
use crate::serverless::staging::FunctionEnv;

pub const NAME: &str = "logs-assistant";
pub const DEFAULT_AGENT_NAME: &str = "Logs Assistant";
pub const DEFAULT_NAMESPACE: &str = "logs-assistant-template-functions";

const DESCRIPTION: &str = "An AI assistant for analysing DO Application error Logs";

#[derive(Clone)]
pub struct LogsAssistant {
    pub placement: AgentPlacement,
    /// Token the `get_logs` function uses to read app logs
    pub agent_token: String,
    pub agent_name: String,
    pub namespace_label: String,
    pub functions_dir: PathBuf,
}

#[async_trait]
impl Template for LogsAssistant {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = self.placement.describe();
        fields.extend([
            ("agent name", self.agent_name.clone()),
            ("agent token", mask_token(&self.agent_token)),
            ("namespace", self.namespace_label.clone()),
            ("functions", self.functions_dir.display().to_string()),
        ]);
        fields
    }

    async fn deploy(&self, platform: &Platform) -> Result<DeploymentReport> {
        let get_logs = ToolBinding::new(
            "logs-assistant-tools/get_logs",
            "get_logs",
            tool_spec(tools::GET_LOGS)?,
        );

        info!("Deploying functions");
        let env = FunctionEnv::new(&["get_logs"]).secret("AGENT_TOKEN", self.agent_token.as_str());
        let namespace_id = FunctionDeployer::new(platform)
            .deploy(
                &self.namespace_label,
                &self.placement.region,
                &self.functions_dir,
                &env,
            )
            .await?;

        let agents = AgentProvisioner::new(platform);
        let config = self.placement.agent_config(
            &self.agent_name,
            DESCRIPTION,
            prompts::LOGS_ASSISTANT,
            None,
        );
        let agent_uuid = agents.create(&config).await?;

        agents
            .attach_tools(&agent_uuid, &namespace_id, &[get_logs])
            .await?;

        let mut report = DeploymentReport::new(NAME);
        report.agents.push(DeployedAgent::new("assistant", &agent_uuid));
        report.namespace = Some(namespace_id);
        Ok(report)
    }
}
