//! Terminal output for plans, reports and the resource ledger

use colored::Colorize;

use gradient_provisioner::ledger::ResourceRecord;
use gradient_provisioner::DeploymentReport;

/// Print resolved settings as an aligned key/value list
pub fn print_settings(title: &str, fields: &[(&'static str, String)]) {
    println!("{}", title.bold());
    let width = fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in fields {
        println!("  {:<width$}  {}", key.dimmed(), value, width = width);
    }
    println!();
}

pub fn print_report(report: &DeploymentReport) {
    println!();
    println!(
        "{} {} deployed",
        "✓".green().bold(),
        report.template.bold()
    );
    println!("{}", "─".repeat(70));

    for agent in &report.agents {
        println!(
            "  {:<10} {}",
            agent.role.dimmed(),
            agent.console_url().cyan()
        );
        if let Some(url) = &agent.url {
            println!("  {:<10} {}", "", url.dimmed());
        }
    }
    if let Some(namespace) = &report.namespace {
        println!("  {:<10} {}", "functions".dimmed(), namespace);
    }
    if let Some(kb) = &report.knowledge_base {
        println!("  {:<10} {}", "kb".dimmed(), kb);
    }
    if let Some(bucket) = &report.bucket {
        println!("  {:<10} {}", "bucket".dimmed(), bucket);
    }

    for note in &report.notes {
        println!("  {} {}", "!".yellow().bold(), note);
    }
    println!();
    if report.knowledge_base.is_some() {
        println!(
            "Note: it may be a few minutes before the agent is ready to use, as its knowledge base may still be indexing."
        );
    } else {
        println!("Note: it may be a few minutes before the agent is ready to use.");
    }
}

/// List what a run created, marking resources it removed again.
///
/// After a failure nothing is rolled back, so the list goes to stderr with a
/// cleanup hint.
pub fn print_ledger(records: &[ResourceRecord], failed: bool) {
    let line = |text: String| {
        if failed {
            eprintln!("{}", text)
        } else {
            println!("{}", text)
        }
    };

    if records.is_empty() {
        line("No resources were created.".dimmed().to_string());
        return;
    }

    let heading = if failed {
        "Resources created before the failure:"
    } else {
        "Resources created:"
    };
    line(heading.bold().to_string());
    for record in records {
        let state = if record.released {
            "removed".dimmed()
        } else if failed {
            "left".yellow()
        } else {
            "created".green()
        };
        let note = record
            .note
            .as_deref()
            .map(|n| format!("({})", n))
            .unwrap_or_default();
        line(format!(
            "  {:<8} {:<20} {} {}",
            state,
            record.kind.to_string(),
            record.id,
            note.dimmed()
        ));
    }
    if failed {
        line("Resources marked 'left' were not cleaned up and may need removing by hand.".to_string());
    }
}
