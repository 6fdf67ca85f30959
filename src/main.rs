//! adcut command-line editor
//!
//! Edits campaign video projects stored as YAML or JSON snapshots.
//!
//! # Usage
//!
//! ```bash
//! adcut new promo.yaml --source promo.mp4 --duration 0:30
//! adcut split promo.yaml <clip-id> 0:08
//! adcut analyze promo.yaml --goal sales --audience young-adults
//! adcut export promo.yaml --output promo.render.json --resolution 720p
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use adcut::app::container::DefaultAppContainer;
use adcut::cli::{commands, exit_code, Cli, Commands};
use adcut::config_initialization::initialize_configuration_hierarchy;
use adcut::ports::ConfigPort;
use adcut::utils::logging::LoggingSystem;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("{:#}", err);
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let hierarchy = initialize_configuration_hierarchy(&cli).await?;

    let logging = LoggingSystem::new(hierarchy.logging_config().await?);
    logging.initialize()?;
    logging.log_system_info();
    hierarchy.log_summary();

    let config_port: Arc<dyn ConfigPort> = hierarchy.port.clone();
    let container = DefaultAppContainer::with_config(config_port)?;

    info!("Executing {} command", command_name(&cli.command));
    commands::run(&container, cli.command).await
}

fn command_name(command: &Commands) -> &'static str {
    use Commands::*;
    match command {
        New(_) => "new",
        Resolve(_) => "resolve",
        Inspect(_) => "inspect",
        Split(_) => "split",
        Delete(_) => "delete",
        Move(_) => "move",
        AddText(_) => "add-text",
        SetParam(_) => "set-param",
        Lock(_) => "lock",
        Suggest(_) => "suggest",
        Analyze(_) => "analyze",
        Export(_) => "export",
        Config(_) => "config",
    }
}
