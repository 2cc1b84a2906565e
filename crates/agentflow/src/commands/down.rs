use agentflow_cloud::{Deployer, Result, StepOutcome};
use colored::Colorize;

pub async fn handle(deployer: &Deployer) -> Result<()> {
    println!("{}", "Tearing down agent resources".blue().bold());
    println!();

    let report = deployer.down().await?;

    for step in &report.steps {
        match step {
            StepOutcome::Removed { kind, target } => {
                println!("  {} {} '{}' deleted", "✓".green(), kind, target);
            }
            StepOutcome::AlreadyAbsent { kind, target } => {
                println!("  {} {} '{}' was already gone", "✓".green(), kind, target);
            }
            StepOutcome::Declined { kind, target } => {
                println!("  {} {} '{}' kept (not confirmed)", "⚠".yellow(), kind, target);
            }
            StepOutcome::Blocked {
                kind,
                target,
                blockers,
            } => {
                println!(
                    "  {} {} '{}' kept, still referenced by: {}",
                    "⚠".yellow(),
                    kind,
                    target,
                    blockers.join(", ")
                );
            }
            StepOutcome::NotRecorded { kind } => {
                println!("  {} no {} recorded", "-".dimmed(), kind);
            }
        }
    }

    println!();
    if report.is_complete() {
        println!("{} Teardown complete", "✓".green().bold());
    } else {
        println!(
            "{} Teardown partially complete. Resolve the items above and re-run 'agentflow down'.",
            "⚠".yellow().bold()
        );
    }
    Ok(())
}
