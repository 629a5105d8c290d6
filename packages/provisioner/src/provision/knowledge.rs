//! Knowledge bases
//!
//! A knowledge base indexes one Spaces bucket into an OpenSearch database,
//! either an existing one or one the platform creates on the fly.

use anyhow::{bail, Context, Result};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::api::error::ApiError;
use crate::api::types::{KnowledgeBase, KnowledgeBaseConfig};
use crate::config::settings::pause;
use crate::ledger::ResourceKind;
use crate::platform::Platform;

/// When to start an indexing job after creating a knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPolicy {
    /// Only for an existing database; a new database indexes on creation
    ExistingDatabaseOnly,
    /// Always, once the database is ready
    Always,
}

/// What `provision` created
#[derive(Debug, Clone)]
pub struct ProvisionedKnowledgeBase {
    pub uuid: String,
    pub database_id: Option<String>,
    pub indexed: bool,
}

pub struct KnowledgeProvisioner<'a> {
    platform: &'a Platform,
}

impl<'a> KnowledgeProvisioner<'a> {
    pub fn new(platform: &'a Platform) -> Self {
        Self { platform }
    }

    /// Create a knowledge base, returning the platform's view of it
    pub async fn create(&self, config: &KnowledgeBaseConfig) -> Result<KnowledgeBase> {
        info!(name = %config.name, database = ?config.database_id, "Deploying knowledge base");
        let kb = self
            .platform
            .api
            .create_knowledge_base(config)
            .await
            .with_context(|| format!("Failed to create knowledge base '{}'", config.name))?;

        let uuid = kb.uuid.as_deref().filter(|u| !u.is_empty()).ok_or(
            ApiError::MissingField {
                endpoint: "/gen-ai/knowledge_bases".to_string(),
                field: "knowledge_base.uuid",
            },
        )?;
        self.platform
            .ledger
            .record_with_note(ResourceKind::KnowledgeBase, uuid, config.name.clone());
        Ok(kb)
    }

    /// Poll a database until it is online.
    ///
    /// An `error` status or running out of time fails; other statuses and
    /// failed lookups are retried.
    pub async fn wait_for_database(&self, database_id: &str) -> Result<()> {
        let pacing = &self.platform.pacing;
        let max_wait = pacing.database_max_wait();
        let started = Instant::now();
        info!(database = database_id, "Waiting for database to be ready");

        loop {
            match self.platform.api.get_database(database_id).await {
                Ok(cluster) => match cluster.status.as_str() {
                    "online" => {
                        info!(database = database_id, "Database is ready");
                        return Ok(());
                    }
                    "error" => bail!("Database {} failed with error status", database_id),
                    status => {
                        let elapsed = started.elapsed().as_secs();
                        info!(
                            status = status,
                            elapsed_secs = elapsed,
                            remaining_secs = max_wait.as_secs().saturating_sub(elapsed),
                            "Database not ready yet"
                        );
                    }
                },
                Err(e) => warn!(database = database_id, error = %e, "Error checking database status"),
            }

            if started.elapsed() >= max_wait {
                bail!(
                    "Database {} did not become ready within {} seconds",
                    database_id,
                    max_wait.as_secs()
                );
            }
            pause(pacing.database_poll()).await;
        }
    }

    /// Start indexing every data source of a knowledge base
    pub async fn index(&self, kb_uuid: &str) -> Result<()> {
        pause(self.platform.pacing.pre_index()).await;
        info!(knowledge_base = kb_uuid, "Creating indexing job");
        let job = self
            .platform
            .api
            .create_indexing_job(kb_uuid)
            .await
            .with_context(|| format!("Failed to start indexing knowledge base {}", kb_uuid))?;
        self.platform.ledger.record_with_note(
            ResourceKind::IndexingJob,
            job.uuid.unwrap_or_else(|| kb_uuid.to_string()),
            format!("for knowledge base {}", kb_uuid),
        );
        Ok(())
    }

    /// Create a knowledge base, optionally wait for a new database, then
    /// index according to `policy`
    pub async fn provision(
        &self,
        config: &KnowledgeBaseConfig,
        policy: IndexPolicy,
        wait_for_new_database: bool,
    ) -> Result<ProvisionedKnowledgeBase> {
        let kb = self.create(config).await?;
        let uuid = kb.uuid.clone().unwrap_or_default();
        let new_database = config.database_id.is_none();

        if new_database && wait_for_new_database {
            let database_id = kb.database_id.as_deref().ok_or(ApiError::MissingField {
                endpoint: "/gen-ai/knowledge_bases".to_string(),
                field: "knowledge_base.database_id",
            })?;
            info!("New database was created. Waiting for it to be ready");
            self.wait_for_database(database_id).await?;
        }

        let indexed = match policy {
            IndexPolicy::ExistingDatabaseOnly if new_database => {
                info!("New database indexes the knowledge base on creation");
                false
            }
            _ => {
                self.index(&uuid).await?;
                true
            }
        };

        Ok(ProvisionedKnowledgeBase {
            uuid,
            database_id: kb.database_id.or_else(|| config.database_id.clone()),
            indexed,
        })
    }
}
