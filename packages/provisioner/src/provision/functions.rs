//! Serverless function deployment

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::api::error::ApiError;
use crate::config::settings::pause;
use crate::ledger::ResourceKind;
use crate::platform::Platform;
use crate::serverless::staging::{FunctionEnv, StagedProject};

/// Deploys a functions project into a new namespace
pub struct FunctionDeployer<'a> {
    platform: &'a Platform,
}

impl<'a> FunctionDeployer<'a> {
    pub fn new(platform: &'a Platform) -> Self {
        Self { platform }
    }

    /// Create namespace `label`, then stage and deploy `source` into it.
    ///
    /// Returns the namespace id used as `faas_namespace` when attaching tools.
    pub async fn deploy(
        &self,
        label: &str,
        region: &str,
        source: &Path,
        env: &FunctionEnv,
    ) -> Result<String> {
        info!(label = label, region = region, "Creating functions namespace");
        let namespace = match self.platform.api.create_namespace(label, region).await {
            Ok(namespace) => namespace,
            Err(e) if ApiError::find(&e).is_some_and(ApiError::is_conflict) => {
                return Err(e.context(format!(
                    "Failed to create namespace '{}': the label is already in use, choose another namespace label",
                    label
                )));
            }
            Err(e) => {
                return Err(e.context(format!(
                    "Failed to create namespace '{}' in region '{}'",
                    label, region
                )));
            }
        };

        let namespace_id = namespace
            .namespace
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::MissingField {
                endpoint: "/functions/namespaces".to_string(),
                field: "namespace.namespace",
            })
            .with_context(|| {
                format!(
                    "Failed to create namespace '{}' in region '{}'",
                    label, region
                )
            })?;
        self.platform
            .ledger
            .record_with_note(ResourceKind::Namespace, &namespace_id, label);

        info!("Waiting for namespace creation");
        pause(self.platform.pacing.namespace_settle()).await;

        let credentials = &self.platform.credentials;
        self.platform
            .serverless
            .auth_init(&credentials.token, &credentials.context)
            .await?;

        let staged = StagedProject::prepare(source, env)?;

        self.platform
            .serverless
            .connect(&namespace_id, &credentials.token)
            .await?;
        self.platform.serverless.deploy(staged.path()).await?;

        self.platform.ledger.record_with_note(
            ResourceKind::Functions,
            &namespace_id,
            env.functions.join(", "),
        );
        info!(namespace = %namespace_id, "Functions deployed");

        Ok(namespace_id)
    }
}
