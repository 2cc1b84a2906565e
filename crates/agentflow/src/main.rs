mod commands;

use agentflow_cloud::{
    CloudError, ConfirmationGate, Deployer, HttpResourceClient, InteractiveGate, PresetGate,
    StateStore,
};
use agentflow_core::Settings;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "agentflow")]
#[command(about = "Deploy and tear down the cloud resources behind a conversational agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy compute, authorization, and binding in dependency order
    Up,
    /// Tear everything down in reverse order
    Down {
        /// Skip the confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Register a binding for an existing compute resource
    Register {
        /// Compute resource ID or full URI
        compute: String,
        /// Binding display name (defaults to the configured agent name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Delete a binding by display name
    Unregister {
        /// Binding display name
        name: String,
    },
    /// Delete a compute resource once nothing references it
    RemoveCompute {
        /// Compute resource ID or full URI
        compute: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the recorded deployment and re-verify it remotely
    Status,
    /// Show version information
    Version,
}

/// Process exit codes. Operator-fixable problems (configuration,
/// validation, blocked deletes) exit 1; transport, remote, and state
/// failures exit 2. Partial teardowns are reported but still exit 0.
fn exit_code(err: &CloudError) -> i32 {
    match err.root() {
        CloudError::Configuration(_)
        | CloudError::NotFound { .. }
        | CloudError::AmbiguousKey { .. }
        | CloudError::ReferenceInUse { .. } => 1,
        _ => 2,
    }
}

fn gate(yes: bool) -> Arc<dyn ConfirmationGate> {
    if yes {
        Arc::new(PresetGate(true))
    } else {
        Arc::new(InteractiveGate)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if matches!(cli.command, Commands::Version) {
        println!("agentflow {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(command: Commands) -> agentflow_cloud::Result<()> {
    let settings = Settings::from_env()?;
    let client = Arc::new(HttpResourceClient::from_settings(&settings)?);
    let store = StateStore::new(std::env::current_dir()?);

    match command {
        Commands::Up => {
            let deployer = Deployer::new(client, &settings, store, gate(true));
            commands::up::handle(&deployer, &settings).await
        }
        Commands::Down { yes } => {
            let deployer = Deployer::new(client, &settings, store, gate(yes));
            commands::down::handle(&deployer).await
        }
        Commands::Register { compute, name } => {
            let deployer = Deployer::new(client, &settings, store, gate(true));
            commands::register::handle(&deployer, &settings, &compute, name.as_deref()).await
        }
        Commands::Unregister { name } => {
            let deployer = Deployer::new(client, &settings, store, gate(true));
            commands::register::handle_unregister(&deployer, &name).await
        }
        Commands::RemoveCompute { compute, yes } => {
            let deployer = Deployer::new(client, &settings, store, gate(yes));
            commands::compute::handle_remove(&deployer, &settings, &compute).await
        }
        Commands::Status => {
            let deployer = Deployer::new(client, &settings, store, gate(true));
            commands::status::handle(&deployer).await
        }
        Commands::Version => unreachable!("handled before configuration is loaded"),
    }
}
