pub mod context;
pub mod deploy;
pub mod login;
pub mod models;
pub mod seed;
pub mod templates;

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

use gradient_provisioner::config::settings::Settings;
use gradient_provisioner::templates::{
    AgentPlacement, KnowledgeSource, GTE_LARGE_EMBEDDING_UUID, LLAMA_3_3_70B_UUID,
};
use gradient_provisioner::Credentials;

/// Token, doctl context and API endpoint
#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// DigitalOcean API token (default: the token saved by `login`)
    #[arg(long, env = "DIGITALOCEAN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// doctl auth context to register the token under
    #[arg(long, env = "DIGITALOCEAN_CONTEXT")]
    pub context: Option<String>,

    /// API base URL
    #[arg(long, env = "DIGITALOCEAN_API_URL")]
    pub api_url: Option<String>,
}

/// Credentials and API endpoint after applying saved settings
#[derive(Debug)]
pub struct ResolvedAuth {
    pub credentials: Credentials,
    pub api_url: String,
}

impl AuthArgs {
    pub fn resolve(&self, settings: &Settings) -> Result<ResolvedAuth> {
        let token = match self.token.clone().or_else(|| settings.token.clone()) {
            Some(token) if !token.is_empty() => token,
            _ => bail!(
                "No API token. Pass --token, set DIGITALOCEAN_TOKEN or run `gradient-templates login`"
            ),
        };
        Ok(ResolvedAuth {
            credentials: Credentials {
                token,
                context: self
                    .context
                    .clone()
                    .unwrap_or_else(|| settings.context().to_string()),
            },
            api_url: self
                .api_url
                .clone()
                .unwrap_or_else(|| settings.api_url().to_string()),
        })
    }
}

/// Project, region and model for new agents
#[derive(Args, Debug, Clone)]
pub struct PlacementArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Project new resources are created in (default: saved project)
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: Option<String>,

    /// Region for new resources (default: saved region, then tor1)
    #[arg(long, env = "REGION")]
    pub region: Option<String>,

    /// Model the agents run
    #[arg(long, env = "MODEL_UUID", default_value = LLAMA_3_3_70B_UUID)]
    pub model_uuid: String,
}

impl PlacementArgs {
    pub fn resolve(&self, settings: &Settings) -> Result<AgentPlacement> {
        let project_id = self
            .project_id
            .clone()
            .or_else(|| settings.default_project_id.clone())
            .context(
                "No project. Pass --project-id, set PROJECT_ID or run `gradient-templates context set-project`",
            )?;
        uuid::Uuid::parse_str(&self.model_uuid)
            .with_context(|| format!("Model id '{}' is not a UUID", self.model_uuid))?;

        Ok(AgentPlacement {
            project_id,
            region: self
                .region
                .clone()
                .unwrap_or_else(|| settings.region().to_string()),
            model_uuid: self.model_uuid.clone(),
        })
    }
}

/// Local data uploaded to a bucket and indexed into a knowledge base
#[derive(Args, Debug, Clone)]
pub struct KnowledgeArgs {
    /// Knowledge base name
    #[arg(long, env = "KB_NAME")]
    pub kb_name: String,

    /// Spaces bucket created for the data
    #[arg(long, env = "BUCKET_NAME")]
    pub bucket_name: String,

    /// Folder whose files are uploaded
    #[arg(long, env = "DATA_PATH", alias = "documentation-path")]
    pub data_path: PathBuf,

    /// Embedding model for the knowledge base
    #[arg(long, env = "EMBEDDING_MODEL", default_value = GTE_LARGE_EMBEDDING_UUID)]
    pub embedding_model: String,

    /// Existing OpenSearch database (default: create a new one)
    #[arg(long, env = "DATABASE_ID")]
    pub database_id: Option<String>,

    /// Spaces access key (default: generate one for this run)
    #[arg(long, env = "SPACES_ACCESS_KEY", requires = "secret_key")]
    pub access_key: Option<String>,

    /// Spaces secret key
    #[arg(long, env = "SPACES_SECRET_KEY", hide_env_values = true, requires = "access_key")]
    pub secret_key: Option<String>,
}

impl KnowledgeArgs {
    pub fn resolve(&self) -> Result<KnowledgeSource> {
        uuid::Uuid::parse_str(&self.embedding_model).with_context(|| {
            format!("Embedding model id '{}' is not a UUID", self.embedding_model)
        })?;
        Ok(KnowledgeSource {
            kb_name: self.kb_name.clone(),
            bucket_name: self.bucket_name.clone(),
            data_path: self.data_path.clone(),
            embedding_model_uuid: self.embedding_model.clone(),
            database_id: self.database_id.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
        })
    }
}
