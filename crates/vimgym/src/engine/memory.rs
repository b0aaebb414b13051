//! In-process engine with scripted behaviour.
//!
//! It does not interpret Vim commands. Each dispatched command can be given a
//! [`Reaction`] describing the buffer, cursor and mode that follow it; any
//! other command is only recorded. `<Esc>` without a reaction returns to
//! normal mode.

use std::collections::HashMap;

use anyhow::{bail, Result};

use super::Engine;
use crate::puzzle::CursorPos;

/// State changes applied when a scripted command arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    pub text: Option<String>,
    pub cursor: Option<CursorPos>,
    pub mode: Option<String>,
}

impl Reaction {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn mode(mode: &str) -> Self {
        Self {
            mode: Some(mode.to_string()),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }

    pub fn with_cursor(mut self, row: usize, col: usize) -> Self {
        self.cursor = Some(CursorPos::new(row, col));
        self
    }
}

#[derive(Debug, Clone)]
pub struct MemoryEngine {
    lines: Vec<String>,
    cursor: CursorPos,
    mode: String,
    size: (u16, u16),
    sent: Vec<String>,
    loads: usize,
    reactions: HashMap<String, Reaction>,
    fail_sends: bool,
    fail_reads: bool,
    closed: bool,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: CursorPos::default(),
            mode: "n".to_string(),
            size: (80, 24),
            sent: Vec::new(),
            loads: 0,
            reactions: HashMap::new(),
            fail_sends: false,
            fail_reads: false,
            closed: false,
        }
    }

    /// Scripts the state that follows `command`.
    pub fn on(mut self, command: &str, reaction: Reaction) -> Self {
        self.reactions.insert(command.to_string(), reaction);
        self
    }

    /// Every `send_keys` argument so far, in order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Number of successful `load` calls.
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn set_mode(&mut self, mode: &str) {
        self.mode = mode.to_string();
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Makes `send_keys` fail until cleared.
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Makes `lines`, `cursor` and `mode` fail until cleared.
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            bail!("engine is closed");
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        self.check_open()?;
        if self.fail_reads {
            bail!("engine read failed");
        }
        Ok(())
    }
}

impl Engine for MemoryEngine {
    fn load(&mut self, text: &str, cursor: CursorPos) -> Result<()> {
        self.check_open()?;
        self.lines = split_lines(text);
        self.cursor = cursor;
        self.mode = "n".to_string();
        self.loads += 1;
        Ok(())
    }

    fn send_keys(&mut self, keys: &str) -> Result<()> {
        self.check_open()?;
        if self.fail_sends {
            bail!("engine rejected input: {keys}");
        }
        self.sent.push(keys.to_string());

        match self.reactions.get(keys).cloned() {
            Some(reaction) => {
                if let Some(text) = reaction.text {
                    self.lines = split_lines(&text);
                }
                if let Some(cursor) = reaction.cursor {
                    self.cursor = cursor;
                }
                if let Some(mode) = reaction.mode {
                    self.mode = mode;
                }
            }
            None if keys == "<Esc>" => self.mode = "n".to_string(),
            None => {}
        }
        Ok(())
    }

    fn lines(&mut self) -> Result<Vec<String>> {
        self.check_read()?;
        Ok(self.lines.clone())
    }

    fn cursor(&mut self) -> Result<CursorPos> {
        self.check_read()?;
        Ok(self.cursor)
    }

    fn mode(&mut self) -> Result<String> {
        self.check_read()?;
        Ok(self.mode.clone())
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.check_open()?;
        if width > 0 && height > 0 {
            self.size = (width, height);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_replaces_buffer() {
        let mut engine = MemoryEngine::new();
        engine.set_mode("i");
        engine.load("one\ntwo", CursorPos::new(1, 2)).unwrap();

        assert_eq!(engine.lines().unwrap(), vec!["one", "two"]);
        assert_eq!(engine.cursor().unwrap(), CursorPos::new(1, 2));
        assert_eq!(engine.mode().unwrap(), "n");
        assert_eq!(engine.loads(), 1);
    }

    #[test]
    fn test_reactions_apply_on_exact_command() {
        let mut engine = MemoryEngine::new().on(
            "ciw",
            Reaction::text("x bar").with_mode("i").with_cursor(0, 0),
        );
        engine.load("foo bar", CursorPos::default()).unwrap();

        engine.send_keys("ci").unwrap();
        assert_eq!(engine.text(), "foo bar");

        engine.send_keys("ciw").unwrap();
        assert_eq!(engine.text(), "x bar");
        assert_eq!(engine.mode().unwrap(), "i");
        assert_eq!(engine.sent(), &["ci".to_string(), "ciw".to_string()]);
    }

    #[test]
    fn test_escape_returns_to_normal() {
        let mut engine = MemoryEngine::new();
        engine.set_mode("i");
        engine.send_keys("<Esc>").unwrap();
        assert_eq!(engine.mode().unwrap(), "n");
    }

    #[test]
    fn test_failure_injection() {
        let mut engine = MemoryEngine::new();
        engine.fail_sends(true);
        assert!(engine.send_keys("x").is_err());
        assert!(engine.sent().is_empty());

        engine.fail_sends(false);
        engine.fail_reads(true);
        assert!(engine.lines().is_err());
        assert!(engine.mode().is_err());
    }

    #[test]
    fn test_closed_engine_rejects_calls() {
        let mut engine = MemoryEngine::new();
        engine.close().unwrap();
        assert!(engine.is_closed());
        assert!(engine.send_keys("x").is_err());
        assert!(engine.load("a", CursorPos::default()).is_err());
    }

    #[test]
    fn test_resize_ignores_empty_area() {
        let mut engine = MemoryEngine::new();
        engine.resize(120, 40).unwrap();
        engine.resize(0, 10).unwrap();
        assert_eq!(engine.size(), (120, 40));
    }
}
