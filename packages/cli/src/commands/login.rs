use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Password;

use gradient_provisioner::api::client::DoClient;
use gradient_provisioner::config::settings::Settings;
use gradient_provisioner::{ApiError, ControlPlane};

/// Prompt for a token, verify it against the account endpoint and save it
pub async fn run(api_url: Option<String>) -> Result<()> {
    println!("{}", "DigitalOcean Login".bold());
    println!();

    let mut settings = Settings::load().unwrap_or_default();
    if settings.is_authenticated() {
        println!("{}", "A saved token exists and will be replaced.".dimmed());
    }

    if let Some(url) = api_url {
        settings.api_url = Some(url);
    }

    let token: String = Password::new()
        .with_prompt("API Token")
        .interact()?;

    let token = token.trim().to_string();
    if token.is_empty() {
        bail!("Token cannot be empty");
    }

    let client = DoClient::new(&token, settings.api_url())?;
    let account = match client.account().await {
        Ok(account) => account,
        Err(e) if ApiError::find(&e).is_some_and(ApiError::is_unauthorized) => {
            bail!("The token was rejected by {}", settings.api_url())
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Could not verify token against {}", settings.api_url()))
        }
    };

    settings.token = Some(token);
    settings.save()?;

    println!();
    println!(
        "{} Logged in as {}",
        "✓".green().bold(),
        account.email.cyan()
    );
    println!(
        "  Config saved to {}",
        Settings::path()?.display().to_string().dimmed()
    );

    Ok(())
}
