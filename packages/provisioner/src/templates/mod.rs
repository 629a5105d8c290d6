//! Deployment templates
//!
//! Each template is a linear pipeline over the provisioning steps: create the
//! supporting resources, deploy functions, create agents and wire the
//! functions in as tools. The first failing step ends the run.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::api::types::{AgentConfig, KnowledgeBaseConfig};
use crate::config::env::describe_optional_secret;
use crate::platform::Platform;
use crate::provision::agents::console_url;
use crate::provision::knowledge::{IndexPolicy, KnowledgeProvisioner, ProvisionedKnowledgeBase};
use crate::storage::bucket::BucketProvisioner;
use crate::storage::spaces::SpacesCredentials;

pub mod assets;
pub mod data_analysis;
pub mod llm_auditor;
pub mod logs_assistant;
pub mod product_docs;
pub mod quiz_agent;
pub mod sql_agent;
pub mod twilio_agent;

pub use data_analysis::DataAnalysis;
pub use llm_auditor::LlmAuditor;
pub use logs_assistant::LogsAssistant;
pub use product_docs::ProductDocs;
pub use quiz_agent::QuizAgent;
pub use sql_agent::SqlAgent;
pub use twilio_agent::TwilioAgent;

/// Llama 3.3 Instruct (70B)
pub const LLAMA_3_3_70B_UUID: &str = "d754f2d7-d1f0-11ef-bf8f-4e013e2ddde4";

/// GTE Large (v1.5) embedding model
pub const GTE_LARGE_EMBEDDING_UUID: &str = "22653204-79ed-11ef-bf8f-4e013e2ddde4";

/// Functions project deployed when none is given
pub const DEFAULT_FUNCTIONS_DIR: &str = "tools";

#[async_trait]
pub trait Template: Send + Sync {
    /// Command-line name of the template
    fn name(&self) -> &'static str;

    /// Resolved settings for display; secrets are masked
    fn describe(&self) -> Vec<(&'static str, String)>;

    /// Run the pipeline
    async fn deploy(&self, platform: &Platform) -> Result<DeploymentReport>;
}

/// Where agents are created and which model they run
#[derive(Debug, Clone)]
pub struct AgentPlacement {
    pub project_id: String,
    pub region: String,
    pub model_uuid: String,
}

impl AgentPlacement {
    pub fn agent_config(
        &self,
        name: &str,
        description: &str,
        instruction: &str,
        knowledge_base_uuids: Option<Vec<String>>,
    ) -> AgentConfig {
        AgentConfig {
            name: name.to_string(),
            description: description.to_string(),
            instruction: instruction.to_string(),
            model_uuid: self.model_uuid.clone(),
            project_id: self.project_id.clone(),
            region: self.region.clone(),
            knowledge_base_uuids,
        }
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("project", self.project_id.clone()),
            ("region", self.region.clone()),
            ("model", self.model_uuid.clone()),
        ]
    }
}

/// Local data that becomes a bucket-backed knowledge base
#[derive(Clone)]
pub struct KnowledgeSource {
    pub kb_name: String,
    pub bucket_name: String,
    pub data_path: PathBuf,
    pub embedding_model_uuid: String,
    /// Existing OpenSearch database; a new one is created when unset
    pub database_id: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl KnowledgeSource {
    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("knowledge base", self.kb_name.clone()),
            ("bucket", self.bucket_name.clone()),
            ("data path", self.data_path.display().to_string()),
            ("embedding model", self.embedding_model_uuid.clone()),
            (
                "database",
                self.database_id
                    .clone()
                    .unwrap_or_else(|| "new".to_string()),
            ),
            (
                "spaces access key",
                self.access_key
                    .clone()
                    .unwrap_or_else(|| "generated".to_string()),
            ),
            (
                "spaces secret key",
                describe_optional_secret(self.secret_key.as_deref()).to_string(),
            ),
        ]
    }
}

/// How a knowledge base pipeline treats the bucket key and the database
#[derive(Debug, Clone, Copy)]
pub(crate) struct KnowledgePlan {
    pub policy: IndexPolicy,
    pub wait_for_new_database: bool,
    /// Keep a generated Spaces key instead of deleting it after upload
    pub keep_generated_key: bool,
}

pub(crate) struct PreparedKnowledge {
    pub knowledge_base: ProvisionedKnowledgeBase,
    pub credentials: SpacesCredentials,
    pub generated_key: bool,
}

/// Bucket, upload and knowledge base, shared by the retrieval templates
pub(crate) async fn prepare_knowledge(
    platform: &Platform,
    placement: &AgentPlacement,
    source: &KnowledgeSource,
    plan: KnowledgePlan,
) -> Result<PreparedKnowledge> {
    let bucket = BucketProvisioner::new(
        platform,
        &placement.project_id,
        &source.bucket_name,
        &placement.region,
        source.access_key.clone(),
        source.secret_key.clone(),
    )
    .await?;

    bucket.create_bucket().await?;
    info!(path = %source.data_path.display(), "Uploading data to bucket");
    let uploaded = bucket.upload_folder(&source.data_path, "").await?;
    info!(files = uploaded, bucket = %source.bucket_name, "Upload complete");

    if !plan.keep_generated_key {
        bucket.delete_generated_key().await?;
    }

    let config = KnowledgeBaseConfig::for_bucket(
        &source.kb_name,
        &placement.project_id,
        &source.embedding_model_uuid,
        &source.bucket_name,
        &placement.region,
        source.database_id.clone(),
    );
    let knowledge_base = KnowledgeProvisioner::new(platform)
        .provision(&config, plan.policy, plan.wait_for_new_database)
        .await?;

    Ok(PreparedKnowledge {
        knowledge_base,
        credentials: bucket.credentials().clone(),
        generated_key: bucket.generated_key(),
    })
}

/// An agent created by a template
#[derive(Debug, Clone, PartialEq)]
pub struct DeployedAgent {
    pub role: String,
    pub uuid: String,
    pub url: Option<String>,
}

impl DeployedAgent {
    pub fn new(role: &str, uuid: &str) -> Self {
        Self {
            role: role.to_string(),
            uuid: uuid.to_string(),
            url: None,
        }
    }

    pub fn console_url(&self) -> String {
        console_url(&self.uuid)
    }
}

/// Outcome of a successful template run
#[derive(Debug, Clone, Default)]
pub struct DeploymentReport {
    pub template: String,
    /// Primary agent first
    pub agents: Vec<DeployedAgent>,
    pub namespace: Option<String>,
    pub knowledge_base: Option<String>,
    pub bucket: Option<String>,
    pub notes: Vec<String>,
}

impl DeploymentReport {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            ..Default::default()
        }
    }

    /// Console page of the agent users talk to
    pub fn console_url(&self) -> Option<String> {
        self.agents.first().map(DeployedAgent::console_url)
    }
}

/// Every template name, in help order
pub const TEMPLATE_NAMES: [&str; 7] = [
    logs_assistant::NAME,
    sql_agent::NAME,
    twilio_agent::NAME,
    product_docs::NAME,
    quiz_agent::NAME,
    data_analysis::NAME,
    llm_auditor::NAME,
];
