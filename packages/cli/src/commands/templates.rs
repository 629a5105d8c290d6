use anyhow::Result;
use clap::{Command, Subcommand};
use colored::Colorize;

use gradient_provisioner::templates::TEMPLATE_NAMES;

use super::deploy::TemplateCommand;

/// Template names with the one-line help of their deploy subcommand
pub fn catalog() -> Vec<(&'static str, String)> {
    let deploy = TemplateCommand::augment_subcommands(Command::new("deploy"));
    TEMPLATE_NAMES
        .iter()
        .map(|name| {
            let about = deploy
                .find_subcommand(name)
                .and_then(|command| command.get_about())
                .map(|about| about.to_string())
                .unwrap_or_default();
            (*name, about)
        })
        .collect()
}

pub fn run() -> Result<()> {
    println!("{}", "Templates:".bold());
    for (name, about) in catalog() {
        println!("  {:<16} {}", name.cyan(), about);
    }
    println!();
    println!(
        "Run {} to see a template's settings",
        "gradient-templates deploy <template> --help".bold()
    );
    Ok(())
}
