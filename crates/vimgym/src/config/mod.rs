//! Configuration module for vimgym.
//!
//! Handles loading configuration from:
//! - Default values
//! - Config file (~/.config/vimgym/config.toml)
//! - Environment variables
//! - Command-line arguments

mod schema;

pub use schema::{Config, EngineConfig, GrammarConfig, LoggingConfig, PuzzlesConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "VIMGYM_CONFIG_DIR";

/// Environment variable forcing key-decision logging on.
pub const DEBUG_KEYS_ENV: &str = "VIMGYM_DEBUG_KEYS";

/// Returns the config directory path.
///
/// Checks `VIMGYM_CONFIG_DIR` environment variable first, then falls back
/// to the system default (~/.config/vimgym on Linux).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join("vimgym"))
}

/// Returns the default config file path (~/.config/vimgym/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Returns the progress file path (~/.config/vimgym/progress.json)
pub fn progress_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("progress.json"))
}

/// Returns the default log file path (~/.config/vimgym/vimgym.log)
pub fn log_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("vimgym.log"))
}

/// Load configuration from the default path or return defaults
pub fn load_config() -> Result<Config> {
    let mut config = match config_path() {
        Some(path) if path.exists() => load_config_from(&path)?,
        _ => Config::default(),
    };
    apply_env(&mut config);
    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

fn apply_env(config: &mut Config) {
    if let Ok(value) = std::env::var(DEBUG_KEYS_ENV) {
        if matches!(value.trim(), "1" | "true" | "yes" | "on") {
            config.logging.debug_keys = true;
        }
    }
}
