use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use gradient_provisioner::config::env::mask_token;
use gradient_provisioner::config::settings::Settings;
use gradient_provisioner::provision::database::MySqlTarget;
use gradient_provisioner::templates::{
    data_analysis, llm_auditor, logs_assistant, product_docs, quiz_agent, sql_agent,
    twilio_agent, DataAnalysis, LlmAuditor, LogsAssistant, ProductDocs, QuizAgent, SqlAgent,
    TwilioAgent, DEFAULT_FUNCTIONS_DIR,
};
use gradient_provisioner::{Platform, Template};

use super::{AuthArgs, KnowledgeArgs, PlacementArgs};
use crate::output::{print_ledger, print_report, print_settings};

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// Assistant that reads App Platform logs through a function
    LogsAssistant(LogsAssistantArgs),
    /// Assistant that queries a MySQL database as a read-only user
    SqlAgent(SqlAgentArgs),
    /// SMS marketing agent sending through Twilio
    TwilioAgent(TwilioAgentArgs),
    /// Agent answering from uploaded product documentation
    ProductDocs(ProductDocsArgs),
    /// Agent writing quizzes from uploaded data
    QuizAgent(QuizAgentArgs),
    /// Agent analysing CSV files stored in a bucket
    DataAnalysis(DataAnalysisArgs),
    /// Auditor with critic and reviser sub-agents
    LlmAuditor(LlmAuditorArgs),
}

#[derive(Args)]
pub struct LogsAssistantArgs {
    #[command(flatten)]
    placement: PlacementArgs,

    /// Token the get_logs function uses to read app logs
    #[arg(long, env = "AGENT_TOKEN", hide_env_values = true)]
    agent_token: String,

    #[arg(long, env = "AGENT_NAME", default_value = logs_assistant::DEFAULT_AGENT_NAME)]
    agent_name: String,

    /// Functions namespace label
    #[arg(long, env = "NAMESPACE_LABEL", default_value = logs_assistant::DEFAULT_NAMESPACE)]
    namespace_label: String,

    /// Functions project to deploy
    #[arg(long, env = "FUNCTIONS_DIR", default_value = DEFAULT_FUNCTIONS_DIR)]
    functions_dir: PathBuf,
}

#[derive(Args)]
pub struct SqlAgentArgs {
    #[command(flatten)]
    placement: PlacementArgs,

    #[arg(long, env = "DB_HOST")]
    db_host: String,

    #[arg(long, env = "DB_PORT")]
    db_port: u16,

    #[arg(long, env = "DB_NAME")]
    db_name: String,

    /// Admin user that creates the agent's read-only user
    #[arg(long, env = "DB_ADMIN_USER")]
    db_admin_user: String,

    #[arg(long, env = "DB_ADMIN_PASSWORD", hide_env_values = true)]
    db_admin_password: String,

    /// Read-only user the functions connect as
    #[arg(long, env = "AGENT_USER_ID", default_value = sql_agent::DEFAULT_AGENT_USER)]
    agent_user_id: String,

    /// Password for the read-only user (default: generated)
    #[arg(long, env = "AGENT_USER_PASSWORD", hide_env_values = true)]
    agent_user_password: Option<String>,

    #[arg(long, env = "AGENT_NAME", default_value = sql_agent::DEFAULT_AGENT_NAME)]
    agent_name: String,

    #[arg(long, env = "NAMESPACE_LABEL", default_value = sql_agent::DEFAULT_NAMESPACE)]
    namespace_label: String,

    #[arg(long, env = "FUNCTIONS_DIR", default_value = DEFAULT_FUNCTIONS_DIR)]
    functions_dir: PathBuf,
}

#[derive(Args)]
pub struct TwilioAgentArgs {
    #[command(flatten)]
    placement: PlacementArgs,

    #[arg(long, env = "TWILIO_SID")]
    twilio_sid: String,

    #[arg(long, env = "TWILIO_TOKEN", hide_env_values = true)]
    twilio_token: String,

    /// Sender phone number
    #[arg(long, env = "TWILIO_FROM_NUMBER")]
    twilio_from_number: String,

    #[arg(long, env = "AGENT_NAME", default_value = twilio_agent::DEFAULT_AGENT_NAME)]
    agent_name: String,

    #[arg(
        long,
        env = "NAMESPACE",
        alias = "namespace-label",
        default_value = twilio_agent::DEFAULT_NAMESPACE
    )]
    namespace: String,

    #[arg(long, env = "FUNCTIONS_DIR", default_value = DEFAULT_FUNCTIONS_DIR)]
    functions_dir: PathBuf,
}

#[derive(Args)]
pub struct ProductDocsArgs {
    #[command(flatten)]
    placement: PlacementArgs,

    #[command(flatten)]
    knowledge: KnowledgeArgs,

    #[arg(long, env = "PRODUCT_NAME")]
    product_name: String,

    #[arg(long, env = "PRODUCT_DESCRIPTION")]
    product_description: String,

    #[arg(long, env = "AGENT_NAME", default_value = product_docs::DEFAULT_AGENT_NAME)]
    agent_name: String,
}

#[derive(Args)]
pub struct QuizAgentArgs {
    #[command(flatten)]
    placement: PlacementArgs,

    #[command(flatten)]
    knowledge: KnowledgeArgs,

    /// What the uploaded data is about
    #[arg(long, env = "DATA_DESCRIPTION")]
    data_description: String,

    #[arg(long, env = "AGENT_NAME", default_value = quiz_agent::DEFAULT_AGENT_NAME)]
    agent_name: String,
}

#[derive(Args)]
pub struct DataAnalysisArgs {
    #[command(flatten)]
    placement: PlacementArgs,

    #[command(flatten)]
    knowledge: KnowledgeArgs,

    #[arg(long, env = "AGENT_NAME", default_value = data_analysis::DEFAULT_AGENT_NAME)]
    agent_name: String,

    #[arg(long, env = "NAMESPACE_LABEL", default_value = data_analysis::DEFAULT_NAMESPACE)]
    namespace_label: String,

    #[arg(long, env = "FUNCTIONS_DIR", default_value = DEFAULT_FUNCTIONS_DIR)]
    functions_dir: PathBuf,
}

#[derive(Args)]
pub struct LlmAuditorArgs {
    #[command(flatten)]
    placement: PlacementArgs,

    /// Tavily key for the critic's web search
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    tavily_api_key: String,

    #[arg(long, env = "AUDITOR_AGENT_NAME", default_value = llm_auditor::DEFAULT_AUDITOR_NAME)]
    auditor_name: String,

    #[arg(long, env = "CRITIC_AGENT_NAME", default_value = llm_auditor::DEFAULT_CRITIC_NAME)]
    critic_name: String,

    #[arg(long, env = "REVISOR_AGENT_NAME", default_value = llm_auditor::DEFAULT_REVISER_NAME)]
    reviser_name: String,

    /// Knowledge bases the critic checks claims against, comma separated
    #[arg(long = "kbs", env = "KNOWLEDGE_BASE_IDS", value_delimiter = ',')]
    reference_kbs: Vec<String>,

    #[arg(long, env = "NAMESPACE_LABEL", default_value = llm_auditor::DEFAULT_NAMESPACE)]
    namespace_label: String,

    #[arg(long, env = "FUNCTIONS_DIR", default_value = DEFAULT_FUNCTIONS_DIR)]
    functions_dir: PathBuf,
}

impl TemplateCommand {
    fn auth(&self) -> &AuthArgs {
        match self {
            Self::LogsAssistant(args) => &args.placement.auth,
            Self::SqlAgent(args) => &args.placement.auth,
            Self::TwilioAgent(args) => &args.placement.auth,
            Self::ProductDocs(args) => &args.placement.auth,
            Self::QuizAgent(args) => &args.placement.auth,
            Self::DataAnalysis(args) => &args.placement.auth,
            Self::LlmAuditor(args) => &args.placement.auth,
        }
    }

    /// Resolve arguments against saved settings into a runnable template
    fn build(self, settings: &Settings) -> Result<Box<dyn Template>> {
        let template: Box<dyn Template> = match self {
            Self::LogsAssistant(args) => Box::new(LogsAssistant {
                placement: args.placement.resolve(settings)?,
                agent_token: args.agent_token,
                agent_name: args.agent_name,
                namespace_label: args.namespace_label,
                functions_dir: args.functions_dir,
            }),
            Self::SqlAgent(args) => Box::new(SqlAgent {
                placement: args.placement.resolve(settings)?,
                database: MySqlTarget {
                    host: args.db_host,
                    port: args.db_port,
                    database: args.db_name,
                    admin_user: args.db_admin_user,
                    admin_password: args.db_admin_password,
                },
                agent_user: args.agent_user_id,
                agent_password: args.agent_user_password,
                agent_name: args.agent_name,
                namespace_label: args.namespace_label,
                functions_dir: args.functions_dir,
            }),
            Self::TwilioAgent(args) => Box::new(TwilioAgent {
                placement: args.placement.resolve(settings)?,
                account_sid: args.twilio_sid,
                auth_token: args.twilio_token,
                from_number: args.twilio_from_number,
                agent_name: args.agent_name,
                namespace_label: args.namespace,
                functions_dir: args.functions_dir,
            }),
            Self::ProductDocs(args) => Box::new(ProductDocs {
                placement: args.placement.resolve(settings)?,
                knowledge: args.knowledge.resolve()?,
                product_name: args.product_name,
                product_description: args.product_description,
                agent_name: args.agent_name,
            }),
            Self::QuizAgent(args) => Box::new(QuizAgent {
                placement: args.placement.resolve(settings)?,
                knowledge: args.knowledge.resolve()?,
                data_description: args.data_description,
                agent_name: args.agent_name,
            }),
            Self::DataAnalysis(args) => Box::new(DataAnalysis {
                placement: args.placement.resolve(settings)?,
                knowledge: args.knowledge.resolve()?,
                agent_name: args.agent_name,
                namespace_label: args.namespace_label,
                functions_dir: args.functions_dir,
            }),
            Self::LlmAuditor(args) => Box::new(LlmAuditor {
                placement: args.placement.resolve(settings)?,
                tavily_api_key: args.tavily_api_key,
                auditor_name: args.auditor_name,
                critic_name: args.critic_name,
                reviser_name: args.reviser_name,
                reference_kbs: args
                    .reference_kbs
                    .into_iter()
                    .map(|kb| kb.trim().to_string())
                    .filter(|kb| !kb.is_empty())
                    .collect(),
                namespace_label: args.namespace_label,
                functions_dir: args.functions_dir,
            }),
        };
        Ok(template)
    }
}

/// Deploy a template
pub async fn run(command: TemplateCommand, dry_run: bool) -> Result<()> {
    let settings = Settings::load()?;
    let auth = command.auth().resolve(&settings)?;
    let template = command.build(&settings)?;

    let mut fields = vec![
        ("token", mask_token(&auth.credentials.token)),
        ("doctl context", auth.credentials.context.clone()),
    ];
    fields.extend(template.describe());
    print_settings(&format!("Deploying {}", template.name()), &fields);

    if dry_run {
        println!(
            "{} Dry run: settings are valid, nothing was created",
            "✓".green().bold()
        );
        return Ok(());
    }

    let platform = Platform::connect(auth.credentials, &auth.api_url, settings.pacing.clone())?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg} [{elapsed}]")?,
    );
    spinner.set_message(format!("Deploying {}", template.name()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = template.deploy(&platform).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            print_report(&report);
            print_ledger(&platform.ledger.records(), false);
            Ok(())
        }
        Err(e) => {
            print_ledger(&platform.ledger.records(), true);
            Err(e).with_context(|| format!("Deployment of {} failed", template.name()))
        }
    }
}
