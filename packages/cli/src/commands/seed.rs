use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::Confirm;

use gradient_provisioner::config::env::mask_secret;
use gradient_provisioner::provision::database::MySqlTarget;
use gradient_provisioner::provision::demo_data::{seed_demo_database, DEFAULT_DEMO_DATABASE};
use gradient_provisioner::MySqlAdmin;

use crate::output::print_settings;

/// Connection for seeding the demo e-commerce database
#[derive(Args)]
pub struct SeedDemoArgs {
    #[arg(long, env = "DB_HOST")]
    db_host: String,

    #[arg(long, env = "DB_PORT")]
    db_port: u16,

    /// Admin user allowed to create databases
    #[arg(long, env = "DB_ADMIN_USER")]
    db_admin_user: String,

    #[arg(long, env = "DB_ADMIN_PASSWORD", hide_env_values = true)]
    db_admin_password: String,

    /// Database to drop and recreate
    #[arg(long, env = "DB_NAME", default_value = DEFAULT_DEMO_DATABASE)]
    database_name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

impl SeedDemoArgs {
    fn target(&self) -> MySqlTarget {
        MySqlTarget {
            host: self.db_host.clone(),
            port: self.db_port,
            database: self.database_name.clone(),
            admin_user: self.db_admin_user.clone(),
            admin_password: self.db_admin_password.clone(),
        }
    }
}

/// Create the demo database the SQL agent template can be tried against
pub async fn run(args: SeedDemoArgs, dry_run: bool) -> Result<()> {
    let target = args.target();
    print_settings(
        "Seeding demo database",
        &[
            ("db host", target.host.clone()),
            ("db port", target.port.to_string()),
            ("db name", target.database.clone()),
            ("db admin user", target.admin_user.clone()),
            ("db admin password", mask_secret(&target.admin_password)),
        ],
    );

    if dry_run {
        println!(
            "{} Dry run: settings are valid, nothing was changed",
            "✓".green().bold()
        );
        return Ok(());
    }

    if !args.yes {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Drop database '{}' if it exists and recreate it with demo data?",
                target.database
            ))
            .default(false)
            .interact()?;
        if !proceed {
            bail!("Cancelled");
        }
    }

    let statements = seed_demo_database(&MySqlAdmin::new(), &target).await?;
    println!(
        "{} Demo database {} ready ({} statements)",
        "✓".green().bold(),
        target.database.cyan(),
        statements
    );
    Ok(())
}
