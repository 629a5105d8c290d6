//! Twilio marketing agent: drafts SMS campaigns and sends them through a
//! Twilio-backed function

use anyhow::Result;
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

pub const NAME: &str = "twilio-agent";
pub const DEFAULT_AGENT_NAME: &str = "Twilio Marketing Agent";
pub const DEFAULT_NAMESPACE: &str = "twilio-agent-template-functions";

const DESCRIPTION: &str = "An SMS marketing agent that sends campaigns through Twilio";

#[derive(Clone)]
pub struct TwilioAgent {
    pub placement: AgentPlacement,
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164 form
    pub from_number: String,
    pub agent_name: String,
    pub namespace_label: String,
    pub functions_dir: PathBuf,
}

#[async_trait]
impl Template for TwilioAgent {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = self.placement.describe();
        fields.extend([
            ("twilio account sid", self.account_sid.clone()),
            ("twilio auth token", mask_secret(&self.auth_token)),
            ("twilio from number", self.from_number.clone()),
            ("agent name", self.agent_name.clone()),
            ("namespace", self.namespace_label.clone()),
            ("functions", self.functions_dir.display().to_string()),
        ]);
        fields
    }

    async fn deploy(&self, platform: &Platform) -> Result<DeploymentReport> {
        let send_message = ToolBinding::new(
            "twilio-agent-tools/send_message",
            "send_message",
            tool_spec(tools::SEND_MESSAGE)?,
        );

        info!("Deploying functions");
        let env = FunctionEnv::new(&["send_message"])
            .secret("TWILIO_ACCOUNT_SID", self.account_sid.as_str())
            .secret("TWILIO_AUTH_TOKEN", self.auth_token.as_str())
            .secret("TWILIO_FROM_NUMBER", self.from_number.as_str());
        let namespace_id = FunctionDeployer::new(platform)
            .deploy(
                &self.namespace_label,
                &self.placement.region,
                &self.functions_dir,
                &env,
            )
            .await?;

        let agents = AgentProvisioner::new(platform);
        let config = self.placement.agent_config(
            &self.agent_name,
            DESCRIPTION,
            prompts::TWILIO_AGENT,
            None,
        );
        let agent_uuid = agents.create(&config).await?;

        // a freshly created agent rejects function routes for a short while
        pause(platform.pacing.tool_attach()).await;
        agents
            .attach_tool(&agent_uuid, &namespace_id, &send_message)
            .await?;

        let mut report = DeploymentReport::new(NAME);
        report.agents.push(DeployedAgent::new("marketer", &agent_uuid));
        report.namespace = Some(namespace_id);
        report
            .notes
            .push(format!("Messages are sent from {}", self.from_number));
        Ok(report)
    }
}
