//! Control Plane Trait
//!
//! The platform operations the templates rely on. Each method is a single
//! remote call; the platform owns its semantics.

use anyhow::Result;
use async_trait::async_trait;

use crate::api::types::{
    Account, Agent, AgentConfig, AgentFunction, ApiKeyInfo, DatabaseCluster, IndexingJob,
    KnowledgeBase, KnowledgeBaseConfig, Model, Namespace, RetrievalSettings, SpacesKey,
    SpacesKeyRequest,
};

#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Account owning the token
    async fn account(&self) -> Result<Account>;

    /// GenAI models the token can use
    async fn list_models(&self) -> Result<Vec<Model>>;

    /// Create a functions namespace
    async fn create_namespace(&self, label: &str, region: &str) -> Result<Namespace>;

    /// Create an agent
    async fn create_agent(&self, config: &AgentConfig) -> Result<Agent>;

    /// Fetch an agent
    async fn get_agent(&self, uuid: &str) -> Result<Agent>;

    /// Update retrieval options of an agent
    async fn update_agent(&self, uuid: &str, settings: &RetrievalSettings) -> Result<Agent>;

    /// Attach a serverless function to an agent as a tool
    async fn attach_function(&self, agent_uuid: &str, function: &AgentFunction) -> Result<()>;

    /// Create an API key for calling an agent endpoint
    async fn create_agent_api_key(&self, agent_uuid: &str, name: &str) -> Result<ApiKeyInfo>;

    /// Create a knowledge base
    async fn create_knowledge_base(&self, config: &KnowledgeBaseConfig) -> Result<KnowledgeBase>;

    /// Start indexing every data source of a knowledge base
    async fn create_indexing_job(&self, knowledge_base_uuid: &str) -> Result<IndexingJob>;

    /// Fetch a managed database cluster
    async fn get_database(&self, uuid: &str) -> Result<DatabaseCluster>;

    /// Create a Spaces access key
    async fn create_spaces_key(&self, request: &SpacesKeyRequest) -> Result<SpacesKey>;

    /// Delete a Spaces access key
    async fn delete_spaces_key(&self, access_key: &str) -> Result<()>;

    /// Move resources (by URN) into a project
    async fn assign_resources(&self, project_id: &str, urns: &[String]) -> Result<()>;
}
