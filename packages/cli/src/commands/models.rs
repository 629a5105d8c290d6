use anyhow::Result;
use colored::Colorize;

use gradient_provisioner::api::client::DoClient;
use gradient_provisioner::config::settings::Settings;
use gradient_provisioner::ControlPlane;

use super::AuthArgs;

/// List the GenAI models available to the token
pub async fn run(auth: AuthArgs) -> Result<()> {
    let settings = Settings::load()?;
    let auth = auth.resolve(&settings)?;
    let client = DoClient::new(&auth.credentials.token, &auth.api_url)?;

    let mut models = client.list_models().await?;
    if models.is_empty() {
        println!("{}", "No models available.".dimmed());
        return Ok(());
    }
    models.sort_by(|a, b| a.name.cmp(&b.name));

    println!("{}", "Models".bold());
    println!("{}", "─".repeat(70));
    println!("  {:<38} {}", "UUID".dimmed(), "NAME".dimmed());
    println!("{}", "─".repeat(70));
    for model in &models {
        let name = if model.is_foundational.unwrap_or(false) {
            model.name.normal()
        } else {
            model.name.dimmed()
        };
        println!("  {:<38} {}", model.uuid.cyan(), name);
    }
    println!();
    println!("{} model(s)", models.len());

    Ok(())
}
