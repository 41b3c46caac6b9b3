//! Logging setup for the editline binary
//!
//! Logs go to stderr so they never mix with the edited stream on stdout, or
//! to a file when `--log-file` is given. The filter comes from `EDITLINE_LOG`
//! when set, otherwise from the `-v` count.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

pub const LOG_ENV: &str = "EDITLINE_LOG";

/// Default filter directive for a given verbosity
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "editline=warn",
        1 => "editline=debug",
        _ => "editline=trace",
    }
}

/// Initialize logging
///
/// Returns the appender guard when logging to a file; it must be kept alive
/// until the program exits so buffered log lines are written out.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let subscriber = registry().with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(filter),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            let subscriber = registry().with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_filter(filter),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;
            Ok(None)
        }
    }
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
    }

    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}
