//! LLM auditor
//!
//! Three agents: the auditor users talk to, a critic that fact-checks a
//! question and answer pair (with web search and optional reference
//! knowledge bases), and a reviser that proposes edits. The auditor reaches
//! the other two through functions that call their endpoints, so the critic
//! and reviser must be deployed and keyed before the functions go out.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::assets::{prompts, tool_spec, tools};
use super::{AgentPlacement, DeployedAgent, DeploymentReport, Template};
use crate::config::env::mask_secret;
use crate::config::settings::pause;
use crate::platform::Platform;
use crate::provision::agents::{AgentProvisioner, ToolBinding};
use crate::provision::functions::FunctionDeployer;
use crate::serverless::staging::FunctionEnv;

pub const NAME: &str = "llm-auditor";
pub const DEFAULT_AUDITOR_NAME: &str = "Auditor Agent";
pub const DEFAULT_CRITIC_NAME: &str = "Critic Agent";
pub const DEFAULT_REVISER_NAME: &str = "Revisor Agent";
pub const DEFAULT_NAMESPACE: &str = "auditor-agent-template-functions";

/// Name of the keys the auditor's functions use to call the sub-agents
const API_KEY_NAME: &str = "Auditor Agent Key";

const AUDITOR_DESCRIPTION: &str =
    "The Auditor agent used to check the factual validity of a question and answer pair.";
const CRITIC_DESCRIPTION: &str = "The Critic sub agent used by the auditor agent.";
const REVISER_DESCRIPTION: &str = "The Revisor sub-agent used by the auditor agent.";

#[derive(Clone)]
pub struct LlmAuditor {
    pub placement: AgentPlacement,
    pub tavily_api_key: String,
    pub auditor_name: String,
    pub critic_name: String,
    pub reviser_name: String,
    /// Knowledge bases the critic checks claims against
    pub reference_kbs: Vec<String>,
    pub namespace_label: String,
    pub functions_dir: PathBuf,
}

/// A sub-agent the auditor calls over HTTP
struct CallableAgent {
    uuid: String,
    url: String,
    key: String,
}

#[async_trait]
impl Template for LlmAuditor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = self.placement.describe();
        fields.extend([
            ("tavily api key", mask_secret(&self.tavily_api_key)),
            ("auditor name", self.auditor_name.clone()),
            ("critic name", self.critic_name.clone()),
            ("reviser name", self.reviser_name.clone()),
            (
                "reference knowledge bases",
                if self.reference_kbs.is_empty() {
                    "none".to_string()
                } else {
                    self.reference_kbs.join(", ")
                },
            ),
            ("namespace", self.namespace_label.clone()),
            ("functions", self.functions_dir.display().to_string()),
        ]);
        fields
    }

    async fn deploy(&self, platform: &Platform) -> Result<DeploymentReport> {
        let search = ToolBinding::new(
            "auditor-tools/search",
            "search-web",
            tool_spec(tools::SEARCH)?,
        );
        let invoke_critic = ToolBinding::new(
            "auditor-tools/critic",
            "invoke-critic",
            tool_spec(tools::INVOKE_CRITIC)?,
        );
        let invoke_reviser = ToolBinding::new(
            "auditor-tools/revisor",
            "invoke-revisor",
            tool_spec(tools::INVOKE_REVISOR)?,
        );

        let agents = AgentProvisioner::new(platform);

        info!("Creating auditor agent");
        let auditor_uuid = agents
            .create(&self.placement.agent_config(
                &self.auditor_name,
                AUDITOR_DESCRIPTION,
                prompts::AUDITOR,
                None,
            ))
            .await?;

        info!("Creating critic agent");
        let reference_kbs = (!self.reference_kbs.is_empty()).then(|| self.reference_kbs.clone());
        let critic_uuid = agents
            .create(&self.placement.agent_config(
                &self.critic_name,
                CRITIC_DESCRIPTION,
                prompts::CRITIC,
                reference_kbs,
            ))
            .await?;

        info!("Creating reviser agent");
        let reviser_uuid = agents
            .create(&self.placement.agent_config(
                &self.reviser_name,
                REVISER_DESCRIPTION,
                prompts::REVISER,
                None,
            ))
            .await?;

        pause(platform.pacing.agent_settle()).await;
        let urls = agents
            .wait_until_deployed(&[critic_uuid.as_str(), reviser_uuid.as_str()])
            .await?;
        pause(platform.pacing.agent_settle()).await;

        let [critic_url, reviser_url]: [String; 2] = urls
            .try_into()
            .map_err(|_| anyhow!("Expected endpoints for the critic and reviser"))?;

        let critic = CallableAgent {
            key: agents.enable_api_key(&critic_uuid, API_KEY_NAME).await?,
            uuid: critic_uuid,
            url: critic_url,
        };
        let reviser = CallableAgent {
            key: agents.enable_api_key(&reviser_uuid, API_KEY_NAME).await?,
            uuid: reviser_uuid,
            url: reviser_url,
        };

        info!("Deploying functions");
        let env = FunctionEnv::new(&["search", "critic", "revisor"])
            .secret("TAVILY_API_KEY", self.tavily_api_key.as_str())
            .secret("CRITIC_AGENT_ENDPOINT", critic.url.as_str())
            .secret("CRITIC_AGENT_ACCESS_KEY", critic.key.as_str())
            .secret("REVISOR_AGENT_ENDPOINT", reviser.url.as_str())
            .secret("REVISOR_AGENT_ACCESS_KEY", reviser.key.as_str());
        let namespace_id = FunctionDeployer::new(platform)
            .deploy(
                &self.namespace_label,
                &self.placement.region,
                &self.functions_dir,
                &env,
            )
            .await?;

        info!("Attaching search tool to critic agent");
        agents
            .attach_tool(&critic.uuid, &namespace_id, &search)
            .await?;
        info!("Attaching critic and reviser to auditor agent");
        agents
            .attach_tools(&auditor_uuid, &namespace_id, &[invoke_critic, invoke_reviser])
            .await?;

        let mut report = DeploymentReport::new(NAME);
        report.agents.push(DeployedAgent::new("auditor", &auditor_uuid));
        for (role, agent) in [("critic", &critic), ("reviser", &reviser)] {
            report.agents.push(DeployedAgent {
                url: Some(agent.url.clone()),
                ..DeployedAgent::new(role, &agent.uuid)
            });
        }
        report.namespace = Some(namespace_id);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ResourceKind;
    use crate::testing::{functions_project, Harness};

    fn template(functions_dir: PathBuf, reference_kbs: &[&str]) -> LlmAuditor {
        LlmAuditor {
            placement: AgentPlacement {
                project_id: "proj".to_string(),
                region: "tor1".to_string(),
                model_uuid: "model".to_string(),
            },
            tavily_api_key: "tvly-secret".to_string(),
            auditor_name: DEFAULT_AUDITOR_NAME.to_string(),
            critic_name: "critic".to_string(),
            reviser_name: "reviser".to_string(),
            reference_kbs: reference_kbs.iter().map(|s| s.to_string()).collect(),
            namespace_label: DEFAULT_NAMESPACE.to_string(),
            functions_dir,
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let harness = Harness::new();
        let platform = harness.platform();
        let project = functions_project();

        let report = template(project.path().to_path_buf(), &["kb-facts"])
            .deploy(&platform)
            .await
            .unwrap();

        assert_eq!(
            harness.calls(),
            vec![
                "create_agent Auditor Agent",
                "create_agent critic",
                "create_agent reviser",
                "get_agent uuid-critic",
                "get_agent uuid-reviser",
                "create_agent_api_key uuid-critic Auditor Agent Key",
                "create_agent_api_key uuid-reviser Auditor Agent Key",
                "create_namespace auditor-agent-template-functions tor1",
                "auth_init default",
                "connect fn-auditor-agent-template-functions",
                "deploy",
                "attach_function uuid-critic search-web",
                "attach_function uuid-Auditor Agent invoke-critic",
                "attach_function uuid-Auditor Agent invoke-revisor",
            ]
        );

        let configs = harness.agent_configs();
        assert!(configs[0].knowledge_base_uuids.is_none());
        assert_eq!(
            configs[1].knowledge_base_uuids,
            Some(vec!["kb-facts".to_string()])
        );
        assert_eq!(configs[1].description, CRITIC_DESCRIPTION);

        let env = &harness.deployed_env()[0];
        let keys: Vec<&str> = env.lines().filter_map(|l| l.split('=').next()).collect();
        assert_eq!(
            keys,
            vec![
                "SEARCH_TOKEN",
                "CRITIC_TOKEN",
                "REVISOR_TOKEN",
                "TAVILY_API_KEY",
                "CRITIC_AGENT_ENDPOINT",
                "CRITIC_AGENT_ACCESS_KEY",
                "REVISOR_AGENT_ENDPOINT",
                "REVISOR_AGENT_ACCESS_KEY"
            ]
        );
        assert!(env.contains("CRITIC_AGENT_ENDPOINT=https://uuid-critic.agents.example\n"));
        assert!(env.contains("REVISOR_AGENT_ACCESS_KEY=key-uuid-reviser\n"));

        let functions = harness.functions();
        assert_eq!(functions[0].agent_uuid, "uuid-critic");
        assert_eq!(functions[0].faas_name, "auditor-tools/search");
        assert_eq!(functions[2].faas_name, "auditor-tools/revisor");

        let roles: Vec<&str> = report.agents.iter().map(|a| a.role.as_str()).collect();
        assert_eq!(roles, vec!["auditor", "critic", "reviser"]);
        assert_eq!(
            report.agents[1].url.as_deref(),
            Some("https://uuid-critic.agents.example")
        );
        assert_eq!(
            report.console_url().unwrap(),
            "https://cloud.digitalocean.com/gen-ai/agents/uuid-Auditor Agent"
        );
        assert_eq!(platform.ledger.ids_of(ResourceKind::AgentApiKey).len(), 2);
    }

    #[tokio::test]
    async fn test_critic_without_reference_kbs() {
        let harness = Harness::new();
        let platform = harness.platform();
        let project = functions_project();

        template(project.path().to_path_buf(), &[])
            .deploy(&platform)
            .await
            .unwrap();

        assert!(harness.agent_configs()[1].knowledge_base_uuids.is_none());
    }

    #[tokio::test]
    async fn test_undeployed_agents_stop_before_keys() {
        let harness = Harness::new().agent_ready_after(usize::MAX);
        let platform = harness.platform();
        let project = functions_project();

        let err = template(project.path().to_path_buf(), &[])
            .deploy(&platform)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("did not finish deployment"));
        assert!(!harness
            .calls()
            .iter()
            .any(|c| c.starts_with("create_agent_api_key")));
    }

    #[tokio::test]
    async fn test_missing_api_key_secret_stops_before_functions() {
        let harness = Harness::new().without_api_key_secret();
        let platform = harness.platform();
        let project = functions_project();

        let result = template(project.path().to_path_buf(), &[])
            .deploy(&platform)
            .await;

        assert!(result.is_err());
        assert_eq!(
            harness.calls().last().unwrap(),
            "create_agent_api_key uuid-critic Auditor Agent Key"
        );
        assert!(harness.deployed_env().is_empty());
    }
}
