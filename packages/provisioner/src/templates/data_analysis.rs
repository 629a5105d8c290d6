//! Data analysis agent
//!
//! CSV files go into a bucket that doubles as a knowledge base source and as
//! the working set of the analysis functions. The functions read the bucket
//! directly, so the Spaces key used for the upload is kept and handed to them.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::assets::{prompts, tool_spec, tools};
use super::{
    prepare_knowledge, AgentPlacement, DeployedAgent, DeploymentReport, KnowledgePlan,
    KnowledgeSource, Template,
};
use crate::config::settings::pause;
use crate::platform::Platform;
use crate::provision::agents::{AgentProvisioner, ToolBinding};
use crate::provision::functions::FunctionDeployer;
use crate::provision::knowledge::IndexPolicy;
use crate::serverless::staging::FunctionEnv;

pub const NAME: &str = "data-analysis";
pub const DEFAULT_AGENT_NAME: &str = "Data Analysis Agent";
pub const DEFAULT_NAMESPACE: &str = "data-analysis-agent-tools";

const DESCRIPTION: &str = "Analyses CSV data stored in a Spaces bucket";

const PLAN: KnowledgePlan = KnowledgePlan {
    policy: IndexPolicy::Always,
    wait_for_new_database: true,
    keep_generated_key: true,
};

const FUNCTIONS: [&str; 4] = ["list_files", "load_csv", "get_column_info", "execute_pandas_code"];

#[derive(Clone)]
pub struct DataAnalysis {
    pub placement: AgentPlacement,
    pub knowledge: KnowledgeSource,
    pub agent_name: String,
    pub namespace_label: String,
    pub functions_dir: PathBuf,
}

fn tool_bindings() -> Result<Vec<ToolBinding>> {
    let schemas = [
        tools::LIST_FILES,
        tools::LOAD_CSV,
        tools::GET_COLUMN_INFO,
        tools::EXECUTE_PANDAS_CODE,
    ];
    FUNCTIONS
        .iter()
        .zip(schemas)
        .map(|(function, raw)| {
            Ok(ToolBinding::new(
                &format!("data-analysis-agent-tools/{}", function),
                function,
                tool_spec(raw)?,
            ))
        })
        .collect()
}

#[async_trait]
impl Template for DataAnalysis {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = self.placement.describe();
        fields.extend(self.knowledge.describe());
        fields.extend([
            ("agent name", self.agent_name.clone()),
            ("namespace", self.namespace_label.clone()),
            ("functions", self.functions_dir.display().to_string()),
        ]);
        fields
    }

    async fn deploy(&self, platform: &Platform) -> Result<DeploymentReport> {
        let bindings = tool_bindings()?;

        let prepared = prepare_knowledge(platform, &self.placement, &self.knowledge, PLAN).await?;
        let kb_uuid = prepared.knowledge_base.uuid.clone();

        let agents = AgentProvisioner::new(platform);
        let config = self.placement.agent_config(
            &self.agent_name,
            DESCRIPTION,
            prompts::DATA_ANALYSIS,
            Some(vec![kb_uuid.clone()]),
        );
        let agent_uuid = agents.create(&config).await?;

        pause(platform.pacing.agent_settle()).await;
        agents.update_retrieval(&agent_uuid).await?;

        info!("Deploying functions");
        let credentials = &prepared.credentials;
        let env = FunctionEnv::new(&FUNCTIONS)
            .secret("SPACES_ACCESS_KEY", credentials.access_key.as_str())
            .secret("SPACES_SECRET_KEY", credentials.secret_key.as_str())
            .secret("SPACES_BUCKET", self.knowledge.bucket_name.as_str())
            .secret("SPACES_REGION", self.placement.region.as_str());
        let namespace_id = FunctionDeployer::new(platform)
            .deploy(
                &self.namespace_label,
                &self.placement.region,
                &self.functions_dir,
                &env,
            )
            .await?;

        info!("Waiting before adding tools to the agent");
        pause(platform.pacing.tool_attach()).await;
        agents
            .attach_tools(&agent_uuid, &namespace_id, &bindings)
            .await?;

        let mut report = DeploymentReport::new(NAME);
        report.agents.push(DeployedAgent::new("analyst", &agent_uuid));
        report.namespace = Some(namespace_id);
        report.knowledge_base = Some(kb_uuid);
        report.bucket = Some(self.knowledge.bucket_name.clone());
        if prepared.generated_key {
            report.notes.push(format!(
                "Spaces key {} was created for the functions and stays active",
                credentials.access_key
            ));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ResourceKind;
    use crate::testing::{data_folder, functions_project, Harness};
    use std::path::Path;

    fn template(data_path: &Path, functions_dir: &Path, keys: Option<(&str, &str)>) -> DataAnalysis {
        DataAnalysis {
            placement: AgentPlacement {
                project_id: "proj".to_string(),
                region: "ams3".to_string(),
                model_uuid: "model".to_string(),
            },
            knowledge: KnowledgeSource {
                kb_name: "sales-kb".to_string(),
                bucket_name: "sales".to_string(),
                data_path: data_path.to_path_buf(),
                embedding_model_uuid: "embed".to_string(),
                database_id: Some("db-1".to_string()),
                access_key: keys.map(|(access, _)| access.to_string()),
                secret_key: keys.map(|(_, secret)| secret.to_string()),
            },
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            namespace_label: DEFAULT_NAMESPACE.to_string(),
            functions_dir: functions_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_tool_bindings_follow_function_order() {
        let bindings = tool_bindings().unwrap();
        let names: Vec<&str> = bindings.iter().map(|b| b.function_name.as_str()).collect();
        assert_eq!(names, FUNCTIONS);
        assert_eq!(bindings[3].faas_name, "data-analysis-agent-tools/execute_pandas_code");
    }

    #[tokio::test]
    async fn test_full_pipeline_keeps_generated_key() {
        let harness = Harness::new();
        let platform = harness.platform();
        let data = data_folder(&[("q1.csv", "region,total\n")]);
        let project = functions_project();

        let report = template(data.path(), project.path(), None)
            .deploy(&platform)
            .await
            .unwrap();

        assert_eq!(
            harness.calls(),
            vec![
                "create_spaces_key Agent template key for sales",
                "create_bucket sales ams3",
                "assign_resources proj do:space:sales",
                "upload_file sales q1.csv",
                "create_knowledge_base sales-kb",
                "create_indexing_job kb-sales-kb",
                "create_agent Data Analysis Agent",
                "update_agent uuid-Data Analysis Agent",
                "create_namespace data-analysis-agent-tools ams3",
                "auth_init default",
                "connect fn-data-analysis-agent-tools",
                "deploy",
                "attach_function uuid-Data Analysis Agent list_files",
                "attach_function uuid-Data Analysis Agent load_csv",
                "attach_function uuid-Data Analysis Agent get_column_info",
                "attach_function uuid-Data Analysis Agent execute_pandas_code",
            ]
        );

        let env = &harness.deployed_env()[0];
        assert!(env.contains("SPACES_ACCESS_KEY=GENERATED_ACCESS\n"));
        assert!(env.contains("SPACES_SECRET_KEY=GENERATED_SECRET\n"));
        assert!(env.contains("SPACES_BUCKET=sales\n"));
        assert!(env.contains("SPACES_REGION=ams3\n"));
        assert_eq!(env.lines().filter(|l| l.contains("_TOKEN=")).count(), 4);

        assert_eq!(
            platform.ledger.ids_of(ResourceKind::SpacesKey),
            vec!["GENERATED_ACCESS"]
        );
        assert_eq!(report.notes.len(), 1);
        assert_eq!(report.knowledge_base.as_deref(), Some("kb-sales-kb"));
    }

    #[tokio::test]
    async fn test_supplied_keys_reach_functions() {
        let harness = Harness::new();
        let platform = harness.platform();
        let data = data_folder(&[("q1.csv", "region,total\n")]);
        let project = functions_project();

        let report = template(data.path(), project.path(), Some(("MY_AK", "MY_SK")))
            .deploy(&platform)
            .await
            .unwrap();

        assert!(!harness
            .calls()
            .iter()
            .any(|c| c.starts_with("create_spaces_key")));
        assert!(harness.deployed_env()[0].contains("SPACES_ACCESS_KEY=MY_AK\n"));
        assert!(report.notes.is_empty());
    }

    #[tokio::test]
    async fn test_indexing_failure_is_fatal() {
        let harness = Harness::new().fail_on("create_indexing_job");
        let platform = harness.platform();
        let data = data_folder(&[("q1.csv", "region,total\n")]);
        let project = functions_project();

        let result = template(data.path(), project.path(), None)
            .deploy(&platform)
            .await;

        assert!(result.is_err());
        assert!(harness.agent_configs().is_empty());
        assert_eq!(harness.calls().last().unwrap(), "create_indexing_job kb-sales-kb");
    }
}
