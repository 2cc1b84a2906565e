use agentflow_cloud::{DeleteOutcome, Deployer, Result};
use agentflow_core::{BindingSpec, ComputeUri, Settings};
use colored::Colorize;

pub async fn handle(
    deployer: &Deployer,
    settings: &Settings,
    compute: &str,
    name: Option<&str>,
) -> Result<()> {
    let uri = ComputeUri::parse_or_bare(compute, &settings.project, &settings.location)?;
    let spec = BindingSpec {
        display_name: name.unwrap_or(&settings.agent_name).to_string(),
        description: settings.agent_description.clone(),
        tool_description: settings.tool_description.clone(),
    };

    let binding = deployer.register(&uri, &spec).await?;
    println!(
        "{} Registered binding '{}' ({}) against {}",
        "✓".green().bold(),
        spec.display_name,
        binding.id.cyan(),
        uri.to_string().cyan()
    );
    Ok(())
}

pub async fn handle_unregister(deployer: &Deployer, name: &str) -> Result<()> {
    match deployer.unregister(name).await? {
        DeleteOutcome::Deleted => {
            println!("{} Binding '{}' deleted", "✓".green().bold(), name);
        }
        DeleteOutcome::AlreadyAbsent => {
            println!("{} Binding '{}' was already gone", "✓".green().bold(), name);
        }
    }
    Ok(())
}
