//! The editing engine the player's keys are forwarded to.
//!
//! The session controller never edits text itself. It sends complete
//! commands to an engine and reads the buffer, cursor and mode back.
//! `NvimEngine` drives a headless Neovim; `MemoryEngine` is an in-process
//! stand-in with scripted reactions.

mod memory;
mod nvim;

pub use memory::{MemoryEngine, Reaction};
pub use nvim::NvimEngine;

use anyhow::Result;

use crate::puzzle::CursorPos;

/// A modal text editor that accepts Vim key notation.
pub trait Engine {
    /// Replaces the buffer with `text` (split on `\n`) and places the cursor.
    fn load(&mut self, text: &str, cursor: CursorPos) -> Result<()>;

    /// Queues keys in Vim notation (`"diw"`, `"<Esc>"`, `"<C-v>"`).
    fn send_keys(&mut self, keys: &str) -> Result<()>;

    /// The buffer's lines, without trailing newlines.
    fn lines(&mut self) -> Result<Vec<String>>;

    /// The cursor as 0-indexed row and byte column.
    fn cursor(&mut self) -> Result<CursorPos>;

    /// The raw mode token as returned by Vim's `mode()` (`"n"`, `"i"`, `"no"`, ...).
    fn mode(&mut self) -> Result<String>;

    /// Informs the engine of the visible editor area.
    fn resize(&mut self, width: u16, height: u16) -> Result<()>;

    /// Shuts the engine down. Further calls fail.
    fn close(&mut self) -> Result<()>;
}
