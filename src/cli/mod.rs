//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod logging;
mod lookup;
mod version;

use clap::{Parser, Subcommand};

pub use commands::{ConfigSubcommand, handle_config_command};
pub use logging::*;
pub use lookup::{
    EventArgs, LogArgs, ReleaseArgs, handle_events_command, handle_logs_command,
    handle_tree_command,
};
pub use version::display_version;

/// release-tree - live resource trees for deployed releases
#[derive(Parser, Debug)]
#[command(name = "release-tree")]
#[command(about = "Live, health-annotated resource trees for deployed releases", long_about = None)]
pub struct Args {
    /// Write debug logs to a temp file
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resource tree of the release deployed for a component
    Tree(ReleaseArgs),
    /// Events recorded against one resource of a release
    Events(EventArgs),
    /// Timestamped container logs of a pod in a release
    Logs(LogArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Show version information
    Version,
}
