//! Tracing setup.
//!
//! The terminal belongs to the puzzle screen while a session runs, so the
//! interactive commands log to a file. Non-interactive commands log to stderr.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target used for per-key sequencer decisions.
pub const KEYS_TARGET: &str = "vimgym::keys";

/// Builds the filter directive for a base level.
///
/// Key decisions are noisy, so they stay off unless `debug_keys` is set.
pub fn filter_directive(level: &str, debug_keys: bool) -> String {
    let level = match level.trim().to_lowercase().as_str() {
        l @ ("error" | "warn" | "info" | "debug" | "trace" | "off") => l.to_string(),
        _ => "warn".to_string(),
    };
    let keys = if debug_keys { "debug" } else { "off" };
    format!("vimgym={level},{KEYS_TARGET}={keys}")
}

/// Initialize the logging system.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_logging(level: &str, debug_keys: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level, debug_keys)));

    match log_file {
        None => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?,
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(file)
                        .with_ansi(false)
                        .with_target(true),
                )
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?
        }
    }

    Ok(())
}
