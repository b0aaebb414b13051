//! Vim key handling for the trainer.
//!
//! # Architecture
//!
//! - `VimMode` / `ModeEstimate`: the engine's mode and our local belief about it
//! - `Grammar`: which keys are operators, wait for a character, switch modes
//! - `Sequencer`: buffers key events into complete commands
//! - `translate_key`: terminal events to Vim key notation
//!
//! # Usage
//!
//! ```ignore
//! let mut seq = Sequencer::new(Grammar::vim());
//! if let Some(key) = translate_key(event) {
//!     if let Step::Dispatch(command) = seq.feed(&key) {
//!         engine.send_keys(&command)?;
//!     }
//! }
//! ```

mod grammar;
mod keys;
mod mode;
mod sequencer;

pub use grammar::{is_digit, Grammar, KeyRole, ESC};
pub use keys::translate_key;
pub use mode::{ModeEstimate, ModeSource, VimMode};
pub use sequencer::{CountOwner, PendingCommand, Sequencer, Step};
