//! release-tree - live, health-annotated resource trees for deployed releases
//!
//! Resolves a component's Release on the control plane and reads the live
//! objects it produced on the data plane through the gateway.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use release_tree::config::ConfigLoader;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config commands work without a cluster or logging
    let command = match args.command {
        Command::Config { subcommand } => return cli::handle_config_command(subcommand),
        Command::Version => {
            cli::display_version();
            return Ok(());
        }
        other => other,
    };

    let config = ConfigLoader::load()?;
    ConfigLoader::check(&config)?;

    if let Some(log_path) = cli::init_logging(args.debug, &config.log_level) {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
    }
    tracing::debug!("Configuration loaded: {:?}", config);

    match command {
        Command::Tree(tree) => cli::handle_tree_command(&config, tree).await,
        Command::Events(events) => cli::handle_events_command(&config, events).await,
        Command::Logs(logs) => cli::handle_logs_command(&config, logs).await,
        Command::Config { .. } | Command::Version => Ok(()),
    }
}
