use agentflow_cloud::{Deployer, Result};
use colored::Colorize;

pub async fn handle(deployer: &Deployer) -> Result<()> {
    let entries = deployer.status().await?;
    if entries.is_empty() {
        println!("No deployment recorded. Run 'agentflow up' first.");
        return Ok(());
    }

    println!("{}", "Recorded deployment".blue().bold());
    for entry in &entries {
        let marker = if entry.present {
            "✓".green()
        } else {
            "✗".red()
        };
        let note = if entry.present {
            "present".to_string()
        } else {
            "missing remotely".red().to_string()
        };
        println!(
            "  {} {:<13} {} ({})",
            marker,
            entry.kind.to_string(),
            entry.target,
            note
        );
    }
    Ok(())
}
