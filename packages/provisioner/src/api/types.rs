//! Wire types for the control-plane API
//!
//! Requests serialize to the JSON bodies the platform expects; responses are
//! wrapped in single-key envelopes (`{"agent": {...}}`) and unwrapped by the
//! client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Account & models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub email: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountEnvelope {
    pub account: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub is_foundational: Option<bool>,
    #[serde(default)]
    pub usecases: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelsEnvelope {
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub links: Links,
}

/// Pagination links of list responses
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub pages: Option<PageLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}

impl Links {
    pub fn has_next(&self) -> bool {
        self.pages
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .is_some_and(|next| !next.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Functions namespaces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NamespaceRequest {
    pub label: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Namespace {
    /// Namespace identifier (`fn-...`); used as `faas_namespace`
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub api_host: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamespaceEnvelope {
    pub namespace: Namespace,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Body for creating an agent
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model_uuid: String,
    pub project_id: String,
    pub region: String,
    #[serde(rename = "knowledge_base_uuid", skip_serializing_if = "Option::is_none")]
    pub knowledge_base_uuids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentDeployment {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub deployment: Option<AgentDeployment>,
}

impl Agent {
    /// Endpoint URL, either top level or under `deployment`
    pub fn endpoint(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| {
                self.deployment
                    .as_ref()
                    .and_then(|d| d.url.as_deref())
                    .filter(|u| !u.is_empty())
            })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentEnvelope {
    pub agent: Agent,
}

/// Retrieval options; the create call does not accept them
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RetrievalSettings {
    pub provide_citations: bool,
    pub retrieval_method: String,
    pub temperature: f64,
    pub k: u32,
    pub max_tokens: u32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            provide_citations: true,
            retrieval_method: "RETRIEVAL_METHOD_SUB_QUERIES".to_string(),
            temperature: 0.6,
            k: 10,
            max_tokens: 1024,
        }
    }
}

/// Body for attaching a serverless function to an agent as a tool
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentFunction {
    pub agent_uuid: String,
    pub description: String,
    pub faas_name: String,
    pub faas_namespace: String,
    pub function_name: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApiKeyRequest {
    pub agent_uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyInfo {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiKeyEnvelope {
    pub api_key_info: ApiKeyInfo,
}

// ---------------------------------------------------------------------------
// Knowledge bases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpacesDataSource {
    pub bucket_name: String,
    pub item_path: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataSource {
    pub spaces_data_source: SpacesDataSource,
}

/// Body for creating a knowledge base backed by one Spaces bucket
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KnowledgeBaseConfig {
    pub name: String,
    /// `null` asks the platform to create a new OpenSearch database
    pub database_id: Option<String>,
    pub embedding_model_uuid: String,
    pub project_id: String,
    pub region: String,
    pub datasources: Vec<DataSource>,
}

impl KnowledgeBaseConfig {
    /// Knowledge base indexing a whole bucket
    pub fn for_bucket(
        name: &str,
        project_id: &str,
        embedding_model_uuid: &str,
        bucket: &str,
        region: &str,
        database_id: Option<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            database_id,
            embedding_model_uuid: embedding_model_uuid.to_string(),
            project_id: project_id.to_string(),
            region: region.to_string(),
            datasources: vec![DataSource {
                spaces_data_source: SpacesDataSource {
                    bucket_name: bucket.to_string(),
                    item_path: String::new(),
                    region: region.to_string(),
                },
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub database_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KnowledgeBaseEnvelope {
    pub knowledge_base: KnowledgeBase,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndexingJobRequest {
    /// Empty means every data source of the knowledge base
    pub data_source_uuids: Vec<String>,
    pub knowledge_base_uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexingJob {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexingJobEnvelope {
    pub job: IndexingJob,
}

// ---------------------------------------------------------------------------
// Databases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseCluster {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "unknown_status")]
    pub status: String,
}

fn unknown_status() -> String {
    "unknown".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct DatabaseEnvelope {
    pub database: DatabaseCluster,
}

// ---------------------------------------------------------------------------
// Spaces keys & projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpacesGrant {
    /// Empty bucket name means every bucket
    pub bucket: String,
    pub permission: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpacesKeyRequest {
    pub name: String,
    pub grants: Vec<SpacesGrant>,
}

impl SpacesKeyRequest {
    /// Full access to all buckets; such keys cannot be narrowed later
    pub fn full_access(name: &str) -> Self {
        Self {
            name: name.to_string(),
            grants: vec![SpacesGrant {
                bucket: String::new(),
                permission: "fullaccess".to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpacesKey {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpacesKeyEnvelope {
    pub key: SpacesKey,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssignResourcesRequest {
    pub resources: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignResourcesEnvelope {
    #[serde(default)]
    #[allow(dead_code)]
    pub resources: Vec<Value>,
}
