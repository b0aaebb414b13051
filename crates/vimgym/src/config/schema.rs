//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editing engine settings
    pub engine: EngineConfig,
    /// Additions to the built-in key grammar
    pub grammar: GrammarConfig,
    /// Puzzle catalogue settings
    pub puzzles: PuzzlesConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Editing engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path or name of the Neovim binary
    pub nvim_path: String,
    /// Delay between a dispatched key and the state read-back
    pub sync_delay_ms: u64,
    /// Timeout for a single engine call
    pub call_timeout_ms: u64,
    /// How long to wait for the engine to start listening
    pub startup_timeout_ms: u64,
    /// Initial editor width in columns
    pub width: u16,
    /// Initial editor height in rows
    pub height: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nvim_path: "nvim".to_string(),
            sync_delay_ms: 10,
            call_timeout_ms: 1000,
            startup_timeout_ms: 3000,
            width: 80,
            height: 24,
        }
    }
}

/// Extra key roles layered over the built-in Vim grammar.
///
/// Keys use the same logical names the sequencer sees (`"<C-v>"`, `"<LT>"`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Keys that start an operator
    pub operators: Vec<String>,
    /// Keys completed by exactly one more key
    pub awaits_char: Vec<String>,
    /// Keys stripped of any built-in role
    pub plain_keys: Vec<String>,
    /// Operators that leave the editor in insert mode
    pub insert_operators: Vec<String>,
    /// Keys that, after an operator, wait for one literal character
    pub motion_prefixes: Vec<String>,
    /// Keys that, after an operator, introduce a text object
    pub text_object_prefixes: Vec<String>,
    /// Key to mode name (`"insert"`, `"visual-line"`, ...)
    pub mode_keys: BTreeMap<String, String>,
}

/// Puzzle catalogue settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzlesConfig {
    /// Directory of extra puzzle JSON files merged with the built-in set
    pub dir: Option<PathBuf>,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter (`RUST_LOG` takes precedence)
    pub level: String,
    /// Log file; defaults to `vimgym.log` in the config directory
    pub file: Option<PathBuf>,
    /// Log every key decision made by the sequencer
    pub debug_keys: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            debug_keys: false,
        }
    }
}
