//! Product documentation agent backed by a knowledge base of uploaded docs

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::assets::{fill_prompt, prompts};
use super::{
    prepare_knowledge, AgentPlacement, DeployedAgent, DeploymentReport, KnowledgePlan,
    KnowledgeSource, Template,
};
use crate::config::settings::pause;
use crate::platform::Platform;
use crate::provision::agents::AgentProvisioner;
use crate::provision::knowledge::IndexPolicy;

pub const NAME: &str = "product-docs";
pub const DEFAULT_AGENT_NAME: &str = "Product Documentation Agent";

const PLAN: KnowledgePlan = KnowledgePlan {
    policy: IndexPolicy::ExistingDatabaseOnly,
    wait_for_new_database: false,
    keep_generated_key: false,
};

#[derive(Clone)]
pub struct ProductDocs {
    pub placement: AgentPlacement,
    pub knowledge: KnowledgeSource,
    pub product_name: String,
    pub product_description: String,
    pub agent_name: String,
}

impl ProductDocs {
    fn instruction(&self) -> String {
        fill_prompt(
            prompts::PRODUCT_DOCS,
            &[
                ("product_name", self.product_name.as_str()),
                ("product_description", self.product_description.as_str()),
            ],
        )
    }
}

#[async_trait]
impl Template for ProductDocs {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = self.placement.describe();
        fields.extend(self.knowledge.describe());
        fields.extend([
            ("product", self.product_name.clone()),
            ("product description", self.product_description.clone()),
            ("agent name", self.agent_name.clone()),
        ]);
        fields
    }

    async fn deploy(&self, platform: &Platform) -> Result<DeploymentReport> {
        let prepared = prepare_knowledge(platform, &self.placement, &self.knowledge, PLAN).await?;
        let kb_uuid = prepared.knowledge_base.uuid.clone();

        let agents = AgentProvisioner::new(platform);
        let description = format!("Answers questions about {}", self.product_name);
        let config = self.placement.agent_config(
            &self.agent_name,
            &description,
            &self.instruction(),
            Some(vec![kb_uuid.clone()]),
        );
        let agent_uuid = agents.create(&config).await?;

        info!("Waiting for the agent before updating retrieval settings");
        pause(platform.pacing.agent_settle()).await;
        agents.update_retrieval(&agent_uuid).await?;

        let mut report = DeploymentReport::new(NAME);
        report.agents.push(DeployedAgent::new("docs", &agent_uuid));
        report.knowledge_base = Some(kb_uuid);
        report.bucket = Some(self.knowledge.bucket_name.clone());
        if !prepared.knowledge_base.indexed {
            report.notes.push(
                "The new database indexes the documents when it comes online".to_string(),
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ResourceKind;
    use crate::templates::GTE_LARGE_EMBEDDING_UUID;
    use crate::testing::{data_folder, Harness};
    use std::path::Path;

    fn template(data_path: &Path, database_id: Option<&str>) -> ProductDocs {
        ProductDocs {
            placement: AgentPlacement {
                project_id: "proj".to_string(),
                region: "tor1".to_string(),
                model_uuid: "model".to_string(),
            },
            knowledge: KnowledgeSource {
                kb_name: "droplet-docs".to_string(),
                bucket_name: "droplet-docs-bucket".to_string(),
                data_path: data_path.to_path_buf(),
                embedding_model_uuid: GTE_LARGE_EMBEDDING_UUID.to_string(),
                database_id: database_id.map(str::to_string),
                access_key: None,
                secret_key: None,
            },
            product_name: "Droplets".to_string(),
            product_description: "Linux virtual machines".to_string(),
            agent_name: DEFAULT_AGENT_NAME.to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_pipeline_with_new_database() {
        let harness = Harness::new();
        let platform = harness.platform();
        let data = data_folder(&[("intro.md", "# Droplets"), ("guides/resize.md", "resize")]);

        let report = template(data.path(), None).deploy(&platform).await.unwrap();

        assert_eq!(
            harness.calls(),
            vec![
                "create_spaces_key Agent template key for droplet-docs-bucket",
                "create_bucket droplet-docs-bucket tor1",
                "assign_resources proj do:space:droplet-docs-bucket",
                "upload_file droplet-docs-bucket guides/resize.md",
                "upload_file droplet-docs-bucket intro.md",
                "delete_spaces_key GENERATED_ACCESS",
                "create_knowledge_base droplet-docs",
                "create_agent Product Documentation Agent",
                "update_agent uuid-Product Documentation Agent",
            ]
        );

        let config = &harness.agent_configs()[0];
        assert_eq!(
            config.knowledge_base_uuids,
            Some(vec!["kb-droplet-docs".to_string()])
        );
        assert!(config.instruction.contains("Product: **Droplets**"));
        assert_eq!(config.description, "Answers questions about Droplets");

        assert_eq!(harness.retrieval_updates()[0].k, 10);
        assert_eq!(report.knowledge_base.as_deref(), Some("kb-droplet-docs"));
        assert_eq!(report.notes.len(), 1);
        assert!(platform.ledger.ids_of(ResourceKind::IndexingJob).is_empty());
        assert!(platform
            .ledger
            .outstanding()
            .iter()
            .all(|r| r.kind != ResourceKind::SpacesKey));
    }

    #[tokio::test]
    async fn test_existing_database_is_indexed() {
        let harness = Harness::new();
        let platform = harness.platform();
        let data = data_folder(&[("intro.md", "# Droplets")]);

        let report = template(data.path(), Some("db-existing"))
            .deploy(&platform)
            .await
            .unwrap();

        let calls = harness.calls();
        let kb = calls
            .iter()
            .position(|c| c == "create_knowledge_base droplet-docs")
            .unwrap();
        assert_eq!(calls[kb + 1], "create_indexing_job kb-droplet-docs");
        assert!(!calls.iter().any(|c| c.starts_with("get_database")));
        assert_eq!(
            harness.knowledge_bases()[0].database_id.as_deref(),
            Some("db-existing")
        );
        assert!(report.notes.is_empty());
    }

    #[tokio::test]
    async fn test_empty_data_folder_stops_before_knowledge_base() {
        let harness = Harness::new();
        let platform = harness.platform();
        let data = data_folder(&[]);

        let result = template(data.path(), None).deploy(&platform).await;

        assert!(result.is_err());
        assert!(harness.knowledge_bases().is_empty());
        // the generated key is left in place and still on the ledger
        assert_eq!(
            platform.ledger.ids_of(ResourceKind::SpacesKey),
            vec!["GENERATED_ACCESS"]
        );
    }
}
