use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use gradient_provisioner::config::env::{
    load_env_file, requested_env_file, EnvFileStatus, ENV_FILE_VAR,
};

mod commands;
mod output;

use commands::context::ContextCommands;
use commands::deploy::TemplateCommand;
use commands::seed::SeedDemoArgs;
use commands::AuthArgs;

#[derive(Parser)]
#[command(
    name = "gradient-templates",
    about = "Deploy DigitalOcean GenAI agent templates"
)]
#[command(version, propagate_version = true)]
struct Cli {
    /// Load environment variables from this file (default: ./.env if present)
    #[arg(long, global = true, value_name = "FILE", env = ENV_FILE_VAR)]
    env_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Resolve and print settings without creating anything
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy an agent template
    Deploy {
        #[command(subcommand)]
        template: TemplateCommand,
    },

    /// List the available templates
    Templates,

    /// Create the demo e-commerce database for the SQL agent
    SeedDemoDb(SeedDemoArgs),

    /// List the GenAI models available to your token
    Models {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Verify an API token and save it for later runs
    Login {
        /// API base URL (default: https://api.digitalocean.com)
        #[arg(long, env = "DIGITALOCEAN_API_URL")]
        api_url: Option<String>,
    },

    /// Manage saved defaults
    Context {
        #[command(subcommand)]
        command: ContextCommands,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Deploy { template } => commands::deploy::run(template, cli.dry_run).await,
        Commands::Templates => commands::templates::run(),
        Commands::SeedDemoDb(args) => commands::seed::run(args, cli.dry_run).await,
        Commands::Models { auth } => commands::models::run(auth).await,
        Commands::Login { api_url } => commands::login::run(api_url).await,
        Commands::Context { command } => commands::context::run(command),
    }
}

#[tokio::main]
async fn main() {
    // flags fall back to environment variables, so the env file is read
    // before clap sees the arguments
    let env_file = requested_env_file(std::env::args_os(), std::env::var_os(ENV_FILE_VAR));
    let env_status = load_env_file(env_file.as_deref());

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match env_status {
        Ok(EnvFileStatus::Loaded(path)) => debug!(path = %path.display(), "Environment file loaded"),
        Ok(EnvFileStatus::Missing(path)) => {
            warn!(path = %path.display(), "Environment file not found, continuing without it")
        }
        Ok(EnvFileStatus::Absent) => {}
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }

    if let Err(e) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
