use agentflow_cloud::{Deployer, Result};
use agentflow_core::Settings;
use colored::Colorize;

pub async fn handle(deployer: &Deployer, settings: &Settings) -> Result<()> {
    println!(
        "{}",
        format!(
            "Deploying agent '{}' to {} ({})",
            settings.agent_name, settings.project, settings.location
        )
        .blue()
        .bold()
    );
    println!();

    let report = deployer.up(&settings.deploy_spec()).await?;

    for service in &report.unverified_services {
        println!(
            "  {} could not verify platform service '{}', continuing",
            "⚠".yellow(),
            service
        );
    }

    println!("{} Deployment complete", "✓".green().bold());
    println!("  compute:       {}", report.compute_uri.cyan());
    println!("  authorization: {}", report.authorization_id.cyan());
    println!("  binding:       {}", report.binding_id.cyan());
    Ok(())
}
