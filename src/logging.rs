//! Tracing setup: stderr plus an optional plain-text log file.

use std::fs::{self, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Builds the filter. `RUST_LOG` wins over the CLI-derived default.
pub(crate) fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs the global subscriber. Logs go to stderr so stdout stays
/// reserved for per-DOI results.
pub(crate) fn init_tracing(default_level: &str, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal());

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory '{}'", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    // A subscriber may already be set (tests); keep the existing one.
    let _ = tracing_subscriber::registry()
        .with(build_filter(default_level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}
