//! API Client
//!
//! HTTP client for the DigitalOcean control-plane API.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::control_plane::ControlPlane;
use crate::api::error::ApiError;
use crate::api::types::*;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "DIGITALOCEAN_API_URL";

/// Items requested per page of a list call
const PAGE_SIZE: u32 = 200;

/// Upper bound on pages followed by one list call
const MAX_PAGES: u32 = 50;

pub struct DoClient {
    client: reqwest::Client,
    base_url: String,
}

impl DoClient {
    /// Create a client for the given token and base URL
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("gradient-templates/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2{}", self.base_url, path)
    }

    /// Send a request and decode the JSON body
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: String,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        debug!(url = %url, status = %status, "API response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_body(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }

    /// Send a request whose successful response has no useful body
    async fn send_empty(
        &self,
        request: reqwest::RequestBuilder,
        url: String,
    ) -> Result<(), ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        debug!(url = %url, status = %status, "API response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_body(status, &body));
        }
        Ok(())
    }

    /// GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        self.send(self.client.get(&url), url).await
    }

    /// POST request
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        self.send(self.client.post(&url).json(body), url).await
    }

    /// PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        self.send(self.client.put(&url).json(body), url).await
    }

    /// DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        self.send_empty(self.client.delete(&url), url).await
    }
}

#[async_trait]
impl ControlPlane for DoClient {
    async fn account(&self) -> Result<Account> {
        let envelope: AccountEnvelope = self.get("/account").await?;
        Ok(envelope.account)
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        let mut models = Vec::new();
        for page in 1..=MAX_PAGES {
            let envelope: ModelsEnvelope = self
                .get(&format!("/gen-ai/models?page={}&per_page={}", page, PAGE_SIZE))
                .await?;
            models.extend(envelope.models);
            if !envelope.links.has_next() {
                return Ok(models);
            }
        }
        warn!(pages = MAX_PAGES, "Stopped following model pages");
        Ok(models)
    }

    async fn create_namespace(&self, label: &str, region: &str) -> Result<Namespace> {
        let request = NamespaceRequest {
            label: label.to_string(),
            region: region.to_string(),
        };
        let envelope: NamespaceEnvelope = self.post("/functions/namespaces", &request).await?;
        Ok(envelope.namespace)
    }

    async fn create_agent(&self, config: &AgentConfig) -> Result<Agent> {
        let envelope: AgentEnvelope = self.post("/gen-ai/agents", config).await?;
        Ok(envelope.agent)
    }

    async fn get_agent(&self, uuid: &str) -> Result<Agent> {
        let envelope: AgentEnvelope = self.get(&format!("/gen-ai/agents/{}", uuid)).await?;
        Ok(envelope.agent)
    }

    async fn update_agent(&self, uuid: &str, settings: &RetrievalSettings) -> Result<Agent> {
        let envelope: AgentEnvelope = self
            .put(&format!("/gen-ai/agents/{}", uuid), settings)
            .await?;
        Ok(envelope.agent)
    }

    async fn attach_function(&self, agent_uuid: &str, function: &AgentFunction) -> Result<()> {
        let _: AgentEnvelope = self
            .post(&format!("/gen-ai/agents/{}/functions", agent_uuid), function)
            .await?;
        Ok(())
    }

    async fn create_agent_api_key(&self, agent_uuid: &str, name: &str) -> Result<ApiKeyInfo> {
        let request = ApiKeyRequest {
            agent_uuid: agent_uuid.to_string(),
            name: name.to_string(),
        };
        let envelope: ApiKeyEnvelope = self
            .post(&format!("/gen-ai/agents/{}/api_keys", agent_uuid), &request)
            .await?;
        Ok(envelope.api_key_info)
    }

    async fn create_knowledge_base(&self, config: &KnowledgeBaseConfig) -> Result<KnowledgeBase> {
        let envelope: KnowledgeBaseEnvelope =
            self.post("/gen-ai/knowledge_bases", config).await?;
        Ok(envelope.knowledge_base)
    }

    async fn create_indexing_job(&self, knowledge_base_uuid: &str) -> Result<IndexingJob> {
        let request = IndexingJobRequest {
            data_source_uuids: Vec::new(),
            knowledge_base_uuid: knowledge_base_uuid.to_string(),
        };
        let envelope: IndexingJobEnvelope = self.post("/gen-ai/indexing_jobs", &request).await?;
        Ok(envelope.job)
    }

    async fn get_database(&self, uuid: &str) -> Result<DatabaseCluster> {
        let envelope: DatabaseEnvelope = self.get(&format!("/databases/{}", uuid)).await?;
        Ok(envelope.database)
    }

    async fn create_spaces_key(&self, request: &SpacesKeyRequest) -> Result<SpacesKey> {
        let envelope: SpacesKeyEnvelope = self.post("/spaces/keys", request).await?;
        Ok(envelope.key)
    }

    async fn delete_spaces_key(&self, access_key: &str) -> Result<()> {
        self.delete(&format!("/spaces/keys/{}", access_key)).await?;
        Ok(())
    }

    async fn assign_resources(&self, project_id: &str, urns: &[String]) -> Result<()> {
        let request = AssignResourcesRequest {
            resources: urns.to_vec(),
        };
        let _: AssignResourcesEnvelope = self
            .post(&format!("/projects/{}/resources", project_id), &request)
            .await?;
        Ok(())
    }
}
