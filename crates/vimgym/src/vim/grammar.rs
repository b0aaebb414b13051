//! The key grammar table driving the sequencer.
//!
//! Which keys start operators, which wait for one more character, which
//! introduce text objects and which switch modes is data, not control flow.
//! The default table describes Vim; `[grammar]` in the config file extends it.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use super::VimMode;
use crate::config::GrammarConfig;

/// The logical name of the escape key.
pub const ESC: &str = "<Esc>";

/// Role of a key typed in normal mode with nothing pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Needs a motion or text object (`d`, `c`, `y`).
    Operator,
    /// Completed by exactly one more key (`f`, `r`, `m`, `"`, `g`).
    AwaitsChar,
}

const DEFAULT_OPERATORS: &[&str] = &["d", "c", "y", ">", "<LT>", "="];
const DEFAULT_INSERT_OPERATORS: &[&str] = &["c"];
const DEFAULT_AWAITS_CHAR: &[&str] = &[
    "r", "f", "t", "F", "T", "m", "'", "`", "g", "z", "@", "q", "[", "]", "\"",
];
const DEFAULT_MOTION_PREFIXES: &[&str] = &["f", "t", "F", "T", "'", "`", "g", "[", "]"];
const DEFAULT_TEXT_OBJECT_PREFIXES: &[&str] = &["i", "a"];
const DEFAULT_MODE_KEYS: &[(&str, VimMode)] = &[
    ("i", VimMode::Insert),
    ("I", VimMode::Insert),
    ("a", VimMode::Insert),
    ("A", VimMode::Insert),
    ("o", VimMode::Insert),
    ("O", VimMode::Insert),
    ("s", VimMode::Insert),
    ("S", VimMode::Insert),
    ("C", VimMode::Insert),
    ("R", VimMode::Replace),
    ("v", VimMode::Visual),
    ("V", VimMode::VisualLine),
    ("<C-v>", VimMode::VisualBlock),
    (":", VimMode::CommandLine),
    ("/", VimMode::CommandLine),
    ("?", VimMode::CommandLine),
];

/// Key-to-role table for one modal-editing dialect.
#[derive(Debug, Clone)]
pub struct Grammar {
    roles: HashMap<String, KeyRole>,
    /// Operators whose completed command leaves the engine in insert mode.
    insert_operators: HashSet<String>,
    /// Keys that, after an operator, wait for one more literal character.
    motion_prefixes: HashSet<String>,
    text_object_prefixes: HashSet<String>,
    mode_keys: HashMap<String, VimMode>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::vim()
    }
}

impl Grammar {
    /// An empty grammar: every key dispatches on its own.
    pub fn empty() -> Self {
        Self {
            roles: HashMap::new(),
            insert_operators: HashSet::new(),
            motion_prefixes: HashSet::new(),
            text_object_prefixes: HashSet::new(),
            mode_keys: HashMap::new(),
        }
    }

    /// The built-in Vim grammar.
    pub fn vim() -> Self {
        let mut grammar = Self::empty();
        for key in DEFAULT_OPERATORS {
            grammar.bind(key, KeyRole::Operator);
        }
        for key in DEFAULT_AWAITS_CHAR {
            grammar.bind(key, KeyRole::AwaitsChar);
        }
        grammar.insert_operators = to_set(DEFAULT_INSERT_OPERATORS);
        grammar.motion_prefixes = to_set(DEFAULT_MOTION_PREFIXES);
        grammar.text_object_prefixes = to_set(DEFAULT_TEXT_OBJECT_PREFIXES);
        grammar.mode_keys = DEFAULT_MODE_KEYS
            .iter()
            .map(|(key, mode)| ((*key).to_string(), *mode))
            .collect();
        grammar
    }

    /// Builds the Vim grammar extended with the config file's `[grammar]` table.
    pub fn from_config(config: &GrammarConfig) -> Result<Self> {
        let mut grammar = Self::vim();

        for key in &config.operators {
            grammar.bind(key, KeyRole::Operator);
        }
        for key in &config.awaits_char {
            if config.operators.contains(key) {
                bail!("grammar key {key:?} cannot be both an operator and awaits_char");
            }
            grammar.bind(key, KeyRole::AwaitsChar);
        }
        for key in &config.plain_keys {
            grammar.unbind(key);
        }
        for key in &config.insert_operators {
            if grammar.role(key) != Some(KeyRole::Operator) {
                bail!("insert operator {key:?} is not an operator");
            }
            grammar.insert_operators.insert(key.clone());
        }
        grammar
            .motion_prefixes
            .extend(config.motion_prefixes.iter().cloned());
        grammar
            .text_object_prefixes
            .extend(config.text_object_prefixes.iter().cloned());
        for (key, name) in &config.mode_keys {
            let Some(mode) = VimMode::from_name(name) else {
                bail!("unknown mode {name:?} for grammar key {key:?}");
            };
            grammar.mode_keys.insert(key.clone(), mode);
        }

        Ok(grammar)
    }

    /// Assigns a role, replacing any previous one.
    pub fn bind(&mut self, key: &str, role: KeyRole) {
        self.roles.insert(key.to_string(), role);
    }

    /// Removes a key's role so it dispatches on its own.
    pub fn unbind(&mut self, key: &str) {
        self.roles.remove(key);
    }

    pub fn role(&self, key: &str) -> Option<KeyRole> {
        self.roles.get(key).copied()
    }

    pub fn is_operator(&self, key: &str) -> bool {
        self.role(key) == Some(KeyRole::Operator)
    }

    pub fn awaits_char(&self, key: &str) -> bool {
        self.role(key) == Some(KeyRole::AwaitsChar)
    }

    pub fn enters_insert(&self, operator: &str) -> bool {
        self.insert_operators.contains(operator)
    }

    pub fn is_motion_prefix(&self, key: &str) -> bool {
        self.motion_prefixes.contains(key)
    }

    pub fn is_text_object_prefix(&self, key: &str) -> bool {
        self.text_object_prefixes.contains(key)
    }

    /// The mode a key switches to when dispatched on its own from normal mode.
    pub fn mode_change(&self, key: &str) -> Option<VimMode> {
        self.mode_keys.get(key).copied()
    }
}

/// True for a single ASCII digit key.
pub fn is_digit(key: &str) -> bool {
    key.len() == 1 && key.as_bytes()[0].is_ascii_digit()
}

fn to_set(keys: &[&str]) -> HashSet<String> {
    keys.iter().map(|k| (*k).to_string()).collect()
}
