use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use gradient_provisioner::config::env::mask_token;
use gradient_provisioner::config::settings::Settings;

#[derive(Subcommand)]
pub enum ContextCommands {
    /// Show saved defaults
    Current,
    /// Set the default project
    SetProject {
        /// Project ID
        project_id: String,
    },
    /// Set the default region
    SetRegion {
        /// Region slug, e.g. tor1
        region: String,
    },
    /// Set the doctl context tokens are registered under
    SetDoctlContext {
        context: String,
    },
    /// Clear saved defaults (the token is kept)
    Clear,
}

pub fn run(cmd: ContextCommands) -> Result<()> {
    let mut settings = Settings::load()?;

    match cmd {
        ContextCommands::Current => {
            println!("{}", "Current Context:".bold());
            println!("  API URL:       {}", settings.api_url().cyan());
            println!(
                "  Project ID:    {}",
                settings
                    .default_project_id
                    .as_deref()
                    .unwrap_or("(not set)")
                    .cyan()
            );
            println!("  Region:        {}", settings.region().cyan());
            println!("  doctl context: {}", settings.context().cyan());
            println!(
                "  Logged in:     {}",
                match settings.token.as_deref() {
                    Some(token) => mask_token(token).green(),
                    None => "no".red(),
                }
            );
        }

        ContextCommands::SetProject { project_id } => {
            settings.default_project_id = Some(project_id.clone());
            settings.save()?;
            println!(
                "{} Default project set to {}",
                "✓".green().bold(),
                project_id.cyan()
            );
        }

        ContextCommands::SetRegion { region } => {
            settings.default_region = Some(region.clone());
            settings.save()?;
            println!(
                "{} Default region set to {}",
                "✓".green().bold(),
                region.cyan()
            );
        }

        ContextCommands::SetDoctlContext { context } => {
            settings.context = Some(context.clone());
            settings.save()?;
            println!(
                "{} doctl context set to {}",
                "✓".green().bold(),
                context.cyan()
            );
        }

        ContextCommands::Clear => {
            settings.default_project_id = None;
            settings.default_region = None;
            settings.context = None;
            settings.save()?;
            println!("{} Context cleared", "✓".green().bold());
        }
    }

    Ok(())
}
