//! Logging initialization

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialize logging
///
/// With `debug`, everything at debug level goes to a temp file and its path is
/// returned. Otherwise logs go to stderr filtered by `RUST_LOG`, falling back
/// to `level`, so stdout only ever carries command output.
pub fn init_logging(debug: bool, level: &str) -> Option<PathBuf> {
    if debug {
        if let Some((path, file)) = open_debug_log() {
            tracing_subscriber::fmt()
                .with_writer(file)
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
                )
                .with_ansi(false) // No ANSI codes in log file
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .init();
            return Some(path);
        }
        eprintln!("Could not create a debug log file, logging to stderr");
    }

    let fallback = if debug { "debug" } else { level };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .init();

    None
}

/// Named temp file that outlives the process
fn open_debug_log() -> Option<(PathBuf, std::fs::File)> {
    let temp = tempfile::Builder::new()
        .prefix("release-tree-")
        .suffix(".log")
        .tempfile()
        .ok()?;
    let (file, path) = temp.keep().ok()?;
    Some((path, file))
}
