//! SQL agent: answers questions from a MySQL database through read-only
//! query functions

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::assets::{prompts, tool_spec, tools};
use super::{AgentPlacement, DeployedAgent, DeploymentReport, Template};
use crate::config::env::mask_secret;
use crate::ledger::ResourceKind;
use crate::platform::Platform;
use crate::provision::agents::{AgentProvisioner, ToolBinding};
use crate::provision::database::MySqlTarget;
use crate::provision::functions::FunctionDeployer;
use crate::serverless::staging::{generate_token, FunctionEnv};

pub const NAME: &str = "sql-agent";
pub const DEFAULT_AGENT_NAME: &str = "SQL Assistant";
pub const DEFAULT_NAMESPACE: &str = "sql-agent-template-functions";
pub const DEFAULT_AGENT_USER: &str = "ai_agent";

const DESCRIPTION: &str = "An AI assistant for SQL databases";

#[derive(Clone)]
pub struct SqlAgent {
    pub placement: AgentPlacement,
    /// Database reached with admin credentials to create the agent's user
    pub database: MySqlTarget,
    pub agent_user: String,
    /// Generated when unset
    pub agent_password: Option<String>,
    pub agent_name: String,
    pub namespace_label: String,
    pub functions_dir: PathBuf,
}

#[async_trait]
impl Template for SqlAgent {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = self.placement.describe();
        fields.extend([
            ("db host", self.database.host.clone()),
            ("db port", self.database.port.to_string()),
            ("db name", self.database.database.clone()),
            ("db admin user", self.database.admin_user.clone()),
            ("db admin password", mask_secret(&self.database.admin_password)),
            ("agent db user", self.agent_user.clone()),
            (
                "agent db password",
                match self.agent_password {
                    Some(ref password) => mask_secret(password),
                    None => "generated".to_string(),
                },
            ),
            ("agent name", self.agent_name.clone()),
            ("namespace", self.namespace_label.clone()),
            ("functions", self.functions_dir.display().to_string()),
        ]);
        fields
    }

    async fn deploy(&self, platform: &Platform) -> Result<DeploymentReport> {
        let bindings = [
            ToolBinding::new(
                "sql-agent-tools/get_schema",
                "get_schema",
                tool_spec(tools::GET_SCHEMA)?,
            ),
            ToolBinding::new(
                "sql-agent-tools/execute_query",
                "execute_query",
                tool_spec(tools::EXECUTE_QUERY)?,
            ),
        ];

        let password = self
            .agent_password
            .clone()
            .unwrap_or_else(generate_token);

        info!(user = %self.agent_user, "Creating agent user in the database");
        platform
            .database
            .create_read_only_user(&self.database, &self.agent_user, &password)
            .await
            .context("Failed to create the agent's database user")?;
        platform.ledger.record_with_note(
            ResourceKind::DatabaseUser,
            &self.agent_user,
            format!("on {}", self.database.database),
        );

        // functions connect as the read-only user, never as admin
        let env = FunctionEnv::new(&["get_schema", "execute_query"])
            .secret("DB_HOST", self.database.host.as_str())
            .secret("DB_PORT", self.database.port.to_string())
            .secret("DB_NAME", self.database.database.as_str())
            .secret("DB_AGENT_USER", self.agent_user.as_str())
            .secret("DB_AGENT_PASSWORD", password);

        info!("Deploying functions");
        let namespace_id = FunctionDeployer::new(platform)
            .deploy(
                &self.namespace_label,
                &self.placement.region,
                &self.functions_dir,
                &env,
            )
            .await?;

        let agents = AgentProvisioner::new(platform);
        let config =
            self.placement
                .agent_config(&self.agent_name, DESCRIPTION, prompts::SQL_AGENT, None);
        let agent_uuid = agents.create(&config).await?;

        agents
            .attach_tools(&agent_uuid, &namespace_id, &bindings)
            .await?;

        let mut report = DeploymentReport::new(NAME);
        report.agents.push(DeployedAgent::new("assistant", &agent_uuid));
        report.namespace = Some(namespace_id);
        report.notes.push(format!(
            "Functions connect to {} as read-only user '{}'",
            self.database.database, self.agent_user
        ));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{functions_project, Harness};

    fn template(functions_dir: PathBuf, agent_password: Option<&str>) -> SqlAgent {
        SqlAgent {
            placement: AgentPlacement {
                project_id: "proj".to_string(),
                region: "tor1".to_string(),
                model_uuid: "model".to_string(),
            },
            database: MySqlTarget {
                host: "db.example".to_string(),
                port: 25060,
                database: "shop".to_string(),
                admin_user: "doadmin".to_string(),
                admin_password: "admin-pass".to_string(),
            },
            agent_user: DEFAULT_AGENT_USER.to_string(),
            agent_password: agent_password.map(str::to_string),
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            namespace_label: DEFAULT_NAMESPACE.to_string(),
            functions_dir,
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let harness = Harness::new();
        let platform = harness.platform();
        let project = functions_project();

        template(project.path().to_path_buf(), Some("agent-pass"))
            .deploy(&platform)
            .await
            .unwrap();

        assert_eq!(
            harness.calls(),
            vec![
                "create_read_only_user ai_agent shop",
                "create_namespace sql-agent-template-functions tor1",
                "auth_init default",
                "connect fn-sql-agent-template-functions",
                "deploy",
                "create_agent SQL Assistant",
                "attach_function uuid-SQL Assistant get_schema",
                "attach_function uuid-SQL Assistant execute_query",
            ]
        );

        let env = &harness.deployed_env()[0];
        let keys: Vec<&str> = env.lines().filter_map(|l| l.split('=').next()).collect();
        assert_eq!(
            keys,
            vec![
                "GET_SCHEMA_TOKEN",
                "EXECUTE_QUERY_TOKEN",
                "DB_HOST",
                "DB_PORT",
                "DB_NAME",
                "DB_AGENT_USER",
                "DB_AGENT_PASSWORD"
            ]
        );
        assert!(env.contains("DB_AGENT_PASSWORD=agent-pass\n"));
        assert!(env.contains("DB_PORT=25060\n"));
        assert!(!env.contains("admin-pass"));
    }

    #[tokio::test]
    async fn test_generates_agent_password() {
        let harness = Harness::new();
        let platform = harness.platform();
        let project = functions_project();

        template(project.path().to_path_buf(), None)
            .deploy(&platform)
            .await
            .unwrap();

        let (user, password) = harness.database_users()[0].clone();
        assert_eq!(user, "ai_agent");
        assert_eq!(password.len(), 22);
        assert!(harness.deployed_env()[0].contains(&format!("DB_AGENT_PASSWORD={}\n", password)));
    }

    #[tokio::test]
    async fn test_database_failure_aborts_before_functions() {
        let harness = Harness::new().fail_on("create_read_only_user");
        let platform = harness.platform();
        let project = functions_project();

        let result = template(project.path().to_path_buf(), None)
            .deploy(&platform)
            .await;

        assert!(result.is_err());
        assert_eq!(harness.calls(), vec!["create_read_only_user ai_agent shop"]);
    }

    #[test]
    fn test_describe_hides_passwords() {
        let shown = format!(
            "{:?}",
            template(PathBuf::from("tools"), Some("agent-pass")).describe()
        );
        assert!(!shown.contains("admin-pass"));
        assert!(!shown.contains("agent-pass"));
    }
}
