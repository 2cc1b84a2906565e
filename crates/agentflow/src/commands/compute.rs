use agentflow_cloud::{Deployer, RemoveOutcome, Result};
use agentflow_core::{ComputeUri, Settings};
use colored::Colorize;

pub async fn handle_remove(deployer: &Deployer, settings: &Settings, compute: &str) -> Result<()> {
    let uri = ComputeUri::parse_or_bare(compute, &settings.project, &settings.location)?;

    match deployer.remove_compute(&uri).await? {
        RemoveOutcome::Deleted => {
            println!("{} Compute resource {} deleted", "✓".green().bold(), uri);
        }
        RemoveOutcome::AlreadyAbsent => {
            println!(
                "{} Compute resource {} was already gone",
                "✓".green().bold(),
                uri
            );
        }
        RemoveOutcome::Declined => {
            println!("{} Delete not confirmed, nothing changed", "⚠".yellow().bold());
        }
    }
    Ok(())
}
