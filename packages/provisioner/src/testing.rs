//! In-memory platform for tests
//!
//! One fake implements every platform trait and records each call as a short
//! line (`"create_bucket docs tor1"`), so tests can assert on the exact
//! sequence a pipeline produced and on where it stopped.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::api::control_plane::ControlPlane;
use crate::api::error::ApiError;
use crate::api::types::*;
use crate::config::settings::Pacing;
use crate::ledger::ResourceLedger;
use crate::platform::{Credentials, Platform};
use crate::provision::database::{DatabaseAdmin, MySqlTarget};
use crate::serverless::doctl::ServerlessCli;
use crate::storage::spaces::{BucketTarget, ObjectStore};

#[derive(Default)]
struct State {
    calls: Vec<String>,
    /// Remaining failures per method; `usize::MAX` fails forever
    failures: HashMap<String, usize>,
    agent_configs: Vec<AgentConfig>,
    retrieval_updates: Vec<RetrievalSettings>,
    functions: Vec<AgentFunction>,
    knowledge_bases: Vec<KnowledgeBaseConfig>,
    deployed_env: Vec<String>,
    database_users: Vec<(String, String)>,
    executed_statements: Vec<String>,
    database_statuses: VecDeque<String>,
    agent_polls: usize,
    agent_ready_after: usize,
    omit_namespace_id: bool,
    omit_agent_uuid: bool,
    omit_api_key_secret: bool,
}

#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<State>,
}

impl FakePlatform {
    /// Log a call, failing it if the method is set up to fail
    fn call(&self, entry: String) -> Result<()> {
        let mut state = self.state.lock();
        let method = entry.split(' ').next().unwrap_or_default().to_string();
        state.calls.push(entry);

        if let Some(remaining) = state.failures.get_mut(&method) {
            if *remaining > 0 {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                return Err(ApiError::Status {
                    status: StatusCode::CONFLICT,
                    id: "conflict".to_string(),
                    message: format!("{} rejected", method),
                    request_id: None,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Handle to a fake platform
#[derive(Clone, Default)]
pub struct Harness {
    fake: Arc<FakePlatform>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call to `method` fails
    pub fn fail_on(self, method: &str) -> Self {
        self.fail_times(method, usize::MAX)
    }

    /// The first `times` calls to `method` fail
    pub fn fail_times(self, method: &str, times: usize) -> Self {
        self.fake
            .state
            .lock()
            .failures
            .insert(method.to_string(), times);
        self
    }

    pub fn without_namespace_id(self) -> Self {
        self.fake.state.lock().omit_namespace_id = true;
        self
    }

    pub fn without_agent_uuid(self) -> Self {
        self.fake.state.lock().omit_agent_uuid = true;
        self
    }

    pub fn without_api_key_secret(self) -> Self {
        self.fake.state.lock().omit_api_key_secret = true;
        self
    }

    /// Agents have no URL for the first `polls` lookups
    pub fn agent_ready_after(self, polls: usize) -> Self {
        self.fake.state.lock().agent_ready_after = polls;
        self
    }

    /// Statuses returned by successive database lookups; the last one sticks
    pub fn database_statuses(self, statuses: &[&str]) -> Self {
        self.fake.state.lock().database_statuses =
            statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform_with_api(self.fake.clone())
    }

    /// Fakes for everything but the control plane
    pub fn platform_with_api(&self, api: Arc<dyn ControlPlane>) -> Platform {
        Platform {
            api,
            serverless: self.fake.clone(),
            storage: self.fake.clone(),
            database: self.fake.clone(),
            credentials: Credentials {
                token: "dop_v1_test".to_string(),
                context: "default".to_string(),
            },
            pacing: Pacing::immediate(),
            ledger: ResourceLedger::new(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.fake.state.lock().calls.clone()
    }

    pub fn agent_configs(&self) -> Vec<AgentConfig> {
        self.fake.state.lock().agent_configs.clone()
    }

    pub fn retrieval_updates(&self) -> Vec<RetrievalSettings> {
        self.fake.state.lock().retrieval_updates.clone()
    }

    pub fn functions(&self) -> Vec<AgentFunction> {
        self.fake.state.lock().functions.clone()
    }

    pub fn knowledge_bases(&self) -> Vec<KnowledgeBaseConfig> {
        self.fake.state.lock().knowledge_bases.clone()
    }

    /// `.env` contents of every deployed functions project
    pub fn deployed_env(&self) -> Vec<String> {
        self.fake.state.lock().deployed_env.clone()
    }

    pub fn database_users(&self) -> Vec<(String, String)> {
        self.fake.state.lock().database_users.clone()
    }

    pub fn executed_statements(&self) -> Vec<String> {
        self.fake.state.lock().executed_statements.clone()
    }
}

/// A minimal functions project on disk
pub fn functions_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("project.yml"), "packages: []\n").unwrap();
    dir
}

/// A data folder holding `files` as (relative path, contents)
pub fn data_folder(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (relative, contents) in files {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
    dir
}

pub fn agent_config(name: &str) -> AgentConfig {
    AgentConfig {
        name: name.to_string(),
        description: "test agent".to_string(),
        instruction: "be helpful".to_string(),
        model_uuid: "model".to_string(),
        project_id: "proj".to_string(),
        region: "tor1".to_string(),
        knowledge_base_uuids: None,
    }
}

#[async_trait]
impl ControlPlane for FakePlatform {
    async fn account(&self) -> Result<Account> {
        self.call("account".to_string())?;
        Ok(Account {
            email: "dev@example.com".to_string(),
            status: Some("active".to_string()),
            uuid: None,
        })
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        self.call("list_models".to_string())?;
        Ok(vec![Model {
            uuid: "model".to_string(),
            name: "Test Model".to_string(),
            is_foundational: Some(true),
            usecases: Vec::new(),
        }])
    }

    async fn create_namespace(&self, label: &str, region: &str) -> Result<Namespace> {
        self.call(format!("create_namespace {} {}", label, region))?;
        let omit = self.state.lock().omit_namespace_id;
        Ok(Namespace {
            namespace: (!omit).then(|| format!("fn-{}", label)),
            label: Some(label.to_string()),
            region: Some(region.to_string()),
            api_host: None,
        })
    }

    async fn create_agent(&self, config: &AgentConfig) -> Result<Agent> {
        self.call(format!("create_agent {}", config.name))?;
        let mut state = self.state.lock();
        state.agent_configs.push(config.clone());
        Ok(Agent {
            uuid: (!state.omit_agent_uuid).then(|| format!("uuid-{}", config.name)),
            name: Some(config.name.clone()),
            url: None,
            deployment: None,
        })
    }

    async fn get_agent(&self, uuid: &str) -> Result<Agent> {
        self.call(format!("get_agent {}", uuid))?;
        let mut state = self.state.lock();
        let ready = state.agent_polls >= state.agent_ready_after;
        state.agent_polls += 1;
        Ok(Agent {
            uuid: Some(uuid.to_string()),
            name: None,
            url: None,
            deployment: Some(AgentDeployment {
                url: ready.then(|| format!("https://{}.agents.example", uuid)),
                status: None,
            }),
        })
    }

    async fn update_agent(&self, uuid: &str, settings: &RetrievalSettings) -> Result<Agent> {
        self.call(format!("update_agent {}", uuid))?;
        self.state.lock().retrieval_updates.push(settings.clone());
        Ok(Agent {
            uuid: Some(uuid.to_string()),
            name: None,
            url: None,
            deployment: None,
        })
    }

    async fn attach_function(&self, agent_uuid: &str, function: &AgentFunction) -> Result<()> {
        self.call(format!(
            "attach_function {} {}",
            agent_uuid, function.function_name
        ))?;
        self.state.lock().functions.push(function.clone());
        Ok(())
    }

    async fn create_agent_api_key(&self, agent_uuid: &str, name: &str) -> Result<ApiKeyInfo> {
        self.call(format!("create_agent_api_key {} {}", agent_uuid, name))?;
        let omit = self.state.lock().omit_api_key_secret;
        Ok(ApiKeyInfo {
            uuid: Some(format!("apikey-{}", agent_uuid)),
            name: Some(name.to_string()),
            secret_key: (!omit).then(|| format!("key-{}", agent_uuid)),
        })
    }

    async fn create_knowledge_base(&self, config: &KnowledgeBaseConfig) -> Result<KnowledgeBase> {
        self.call(format!("create_knowledge_base {}", config.name))?;
        self.state.lock().knowledge_bases.push(config.clone());
        Ok(KnowledgeBase {
            uuid: Some(format!("kb-{}", config.name)),
            name: Some(config.name.clone()),
            database_id: config
                .database_id
                .clone()
                .or_else(|| Some("db-new".to_string())),
        })
    }

    async fn create_indexing_job(&self, knowledge_base_uuid: &str) -> Result<IndexingJob> {
        self.call(format!("create_indexing_job {}", knowledge_base_uuid))?;
        Ok(IndexingJob {
            uuid: Some(format!("job-{}", knowledge_base_uuid)),
            status: Some("INDEX_JOB_STATUS_PENDING".to_string()),
        })
    }

    async fn get_database(&self, uuid: &str) -> Result<DatabaseCluster> {
        self.call(format!("get_database {}", uuid))?;
        let mut state = self.state.lock();
        let status = if state.database_statuses.len() > 1 {
            state.database_statuses.pop_front()
        } else {
            state.database_statuses.front().cloned()
        };
        Ok(DatabaseCluster {
            id: Some(uuid.to_string()),
            name: None,
            status: status.unwrap_or_else(|| "online".to_string()),
        })
    }

    async fn create_spaces_key(&self, request: &SpacesKeyRequest) -> Result<SpacesKey> {
        self.call(format!("create_spaces_key {}", request.name))?;
        Ok(SpacesKey {
            name: Some(request.name.clone()),
            access_key: Some("GENERATED_ACCESS".to_string()),
            secret_key: Some("GENERATED_SECRET".to_string()),
        })
    }

    async fn delete_spaces_key(&self, access_key: &str) -> Result<()> {
        self.call(format!("delete_spaces_key {}", access_key))
    }

    async fn assign_resources(&self, project_id: &str, urns: &[String]) -> Result<()> {
        self.call(format!("assign_resources {} {}", project_id, urns.join(",")))
    }
}

#[async_trait]
impl ServerlessCli for FakePlatform {
    async fn auth_init(&self, _token: &str, context: &str) -> Result<()> {
        self.call(format!("auth_init {}", context))
    }

    async fn connect(&self, namespace: &str, _token: &str) -> Result<()> {
        self.call(format!("connect {}", namespace))
    }

    async fn deploy(&self, project_dir: &Path) -> Result<()> {
        self.call("deploy".to_string())?;
        let env = std::fs::read_to_string(project_dir.join(".env"))?;
        self.state.lock().deployed_env.push(env);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FakePlatform {
    async fn create_bucket(&self, target: &BucketTarget) -> Result<()> {
        self.call(format!("create_bucket {} {}", target.bucket, target.region))
    }

    async fn upload_file(&self, target: &BucketTarget, key: &str, _path: &Path) -> Result<()> {
        self.call(format!("upload_file {} {}", target.bucket, key))
    }
}

#[async_trait]
impl DatabaseAdmin for FakePlatform {
    async fn create_read_only_user(
        &self,
        target: &MySqlTarget,
        user: &str,
        password: &str,
    ) -> Result<()> {
        self.call(format!("create_read_only_user {} {}", user, target.database))?;
        self.state
            .lock()
            .database_users
            .push((user.to_string(), password.to_string()));
        Ok(())
    }

    async fn execute(&self, target: &MySqlTarget, statements: &[String]) -> Result<()> {
        self.call(format!("execute {} {}", target.database, statements.len()))?;
        self.state
            .lock()
            .executed_statements
            .extend(statements.iter().cloned());
        Ok(())
    }
}

/// A request received by `MockServer`
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// HTTP/1.1 server on a local port answering with canned JSON responses,
/// one per connection, in order
pub struct MockServer {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (stream, _) = listener.accept().await.unwrap();
                let mut reader = BufReader::new(stream);

                let mut request_line = String::new();
                reader.read_line(&mut request_line).await.unwrap();
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();

                let mut headers = HashMap::new();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).await.unwrap();
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        headers.insert(name.trim().to_lowercase(), value.trim().to_string());
                    }
                }

                let length: usize = headers
                    .get("content-length")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let mut request_body = vec![0u8; length];
                reader.read_exact(&mut request_body).await.unwrap();

                recorded.lock().push(RecordedRequest {
                    method,
                    path,
                    authorization: headers.get("authorization").cloned(),
                    body: String::from_utf8_lossy(&request_body).into_owned(),
                });

                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let mut stream = reader.into_inner();
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });

        Self { url, requests }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}
