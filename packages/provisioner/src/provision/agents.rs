//! Agent provisioning
//!
//! Creates agents, tunes retrieval, attaches deployed functions as tools and
//! issues API keys so agents can be called from functions.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::error::ApiError;
use crate::api::types::{AgentConfig, AgentFunction, RetrievalSettings};
use crate::config::settings::pause;
use crate::ledger::ResourceKind;
use crate::platform::Platform;

/// Control panel page of an agent
pub fn console_url(agent_uuid: &str) -> String {
    format!("https://cloud.digitalocean.com/gen-ai/agents/{}", agent_uuid)
}

/// Description and schemas of a tool, as shipped with a template
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ToolSpec {
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

/// A deployed function exposed to an agent under `function_name`
#[derive(Debug, Clone)]
pub struct ToolBinding {
    /// `<package>/<function>` inside the namespace
    pub faas_name: String,
    pub function_name: String,
    pub spec: ToolSpec,
}

impl ToolBinding {
    pub fn new(faas_name: &str, function_name: &str, spec: ToolSpec) -> Self {
        Self {
            faas_name: faas_name.to_string(),
            function_name: function_name.to_string(),
            spec,
        }
    }

    /// Request body attaching this tool to `agent_uuid`
    pub fn to_function(&self, agent_uuid: &str, namespace_id: &str) -> AgentFunction {
        AgentFunction {
            agent_uuid: agent_uuid.to_string(),
            description: self.spec.description.clone(),
            faas_name: self.faas_name.clone(),
            faas_namespace: namespace_id.to_string(),
            function_name: self.function_name.clone(),
            input_schema: self.spec.input_schema.clone(),
            output_schema: self.spec.output_schema.clone(),
        }
    }
}

pub struct AgentProvisioner<'a> {
    platform: &'a Platform,
}

impl<'a> AgentProvisioner<'a> {
    pub fn new(platform: &'a Platform) -> Self {
        Self { platform }
    }

    /// Create an agent and return its uuid
    pub async fn create(&self, config: &AgentConfig) -> Result<String> {
        info!(name = %config.name, model = %config.model_uuid, "Creating agent");
        let agent = self
            .platform
            .api
            .create_agent(config)
            .await
            .with_context(|| format!("Failed to create agent '{}'", config.name))?;

        let uuid = agent
            .uuid
            .filter(|u| !u.is_empty())
            .ok_or(ApiError::MissingField {
                endpoint: "/gen-ai/agents".to_string(),
                field: "agent.uuid",
            })?;
        self.platform
            .ledger
            .record_with_note(ResourceKind::Agent, &uuid, config.name.clone());
        info!(uuid = %uuid, "Agent created");
        Ok(uuid)
    }

    /// Apply the default retrieval settings, which agent creation does not accept
    pub async fn update_retrieval(&self, agent_uuid: &str) -> Result<()> {
        info!(uuid = agent_uuid, "Updating agent retrieval settings");
        self.platform
            .api
            .update_agent(agent_uuid, &RetrievalSettings::default())
            .await
            .with_context(|| format!("Failed to update retrieval settings of {}", agent_uuid))?;
        Ok(())
    }

    /// Attach a deployed function to an agent
    pub async fn attach_tool(
        &self,
        agent_uuid: &str,
        namespace_id: &str,
        tool: &ToolBinding,
    ) -> Result<()> {
        let function = tool.to_function(agent_uuid, namespace_id);
        self.platform
            .api
            .attach_function(agent_uuid, &function)
            .await
            .with_context(|| {
                format!(
                    "Failed to add tool {} to agent {}",
                    tool.function_name, agent_uuid
                )
            })?;
        self.platform.ledger.record_with_note(
            ResourceKind::AgentFunction,
            &tool.function_name,
            format!("on agent {}", agent_uuid),
        );
        info!(agent = agent_uuid, tool = %tool.function_name, "Tool added to agent");
        Ok(())
    }

    /// Attach tools in order, stopping at the first failure
    pub async fn attach_tools(
        &self,
        agent_uuid: &str,
        namespace_id: &str,
        tools: &[ToolBinding],
    ) -> Result<()> {
        info!(
            count = tools.len(),
            agent = agent_uuid,
            namespace = namespace_id,
            "Adding tools to agent"
        );
        for tool in tools {
            self.attach_tool(agent_uuid, namespace_id, tool).await?;
        }
        Ok(())
    }

    /// Wait until every agent exposes an endpoint URL.
    ///
    /// Returns the URLs in the order of `uuids`.
    pub async fn wait_until_deployed(&self, uuids: &[&str]) -> Result<Vec<String>> {
        let pacing = &self.platform.pacing;
        let started = Instant::now();

        loop {
            debug!("Polling agent deployment status");
            let mut urls = Vec::with_capacity(uuids.len());
            for uuid in uuids {
                match self.platform.api.get_agent(uuid).await {
                    Ok(agent) => match agent.endpoint() {
                        Some(url) => urls.push(url.to_string()),
                        None => break,
                    },
                    Err(e) => {
                        warn!(uuid = uuid, error = %e, "Could not fetch agent status");
                        break;
                    }
                }
            }
            if urls.len() == uuids.len() {
                info!(count = uuids.len(), "Agents deployed");
                return Ok(urls);
            }

            if started.elapsed() >= pacing.agent_max_wait() {
                bail!(
                    "Agents did not finish deployment within {} seconds",
                    pacing.agent_max_wait().as_secs()
                );
            }
            pause(pacing.agent_poll()).await;
        }
    }

    /// Create an API key for an agent and return its secret
    pub async fn enable_api_key(&self, agent_uuid: &str, name: &str) -> Result<String> {
        info!(agent = agent_uuid, "Enabling API key for agent");
        let key = self
            .platform
            .api
            .create_agent_api_key(agent_uuid, name)
            .await
            .with_context(|| format!("Failed to create API key for agent {}", agent_uuid))?;

        let secret = key
            .secret_key
            .filter(|s| !s.is_empty())
            .ok_or(ApiError::MissingField {
                endpoint: "/gen-ai/agents/{uuid}/api_keys".to_string(),
                field: "api_key_info.secret_key",
            })?;
        self.platform.ledger.record_with_note(
            ResourceKind::AgentApiKey,
            key.uuid.unwrap_or_else(|| name.to_string()),
            format!("for agent {}", agent_uuid),
        );
        Ok(secret)
    }
}
