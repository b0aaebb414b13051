//! Test utilities for vimgym integration tests.
//!
//! Drives a [`SessionController`] the way the app loop does, except that each
//! synchronization runs immediately instead of after the configured delay.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use vimgym::engine::Engine;
use vimgym::progress::ResultSink;
use vimgym::puzzle::{builtin, Puzzle};
use vimgym::session::{SessionController, SyncOutcome};

/// Environment variable naming the Neovim binary for the engine tests.
pub const NVIM_ENV: &str = "VIMGYM_TEST_NVIM";

/// Looks up a built-in puzzle by id.
pub fn puzzle(id: &str) -> Puzzle {
    builtin()
        .expect("built-in puzzles should load")
        .into_iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("no built-in puzzle {id}"))
}

/// Starts `puzzle` and runs its initial synchronization.
pub fn start<E: Engine>(
    session: &mut SessionController<E>,
    puzzle: Puzzle,
    sink: &mut dyn ResultSink,
) -> SyncOutcome {
    let ticket = session
        .start_puzzle(puzzle)
        .expect("engine should accept the puzzle");
    session.synchronize(&ticket, sink)
}

/// Feeds `keys` one at a time, synchronizing after every dispatch.
///
/// Returns the outcome of each synchronization, in order.
pub fn type_keys<E: Engine>(
    session: &mut SessionController<E>,
    keys: &[&str],
    sink: &mut dyn ResultSink,
) -> Vec<SyncOutcome> {
    let mut outcomes = Vec::new();
    for key in keys {
        if let Some(ticket) = session.handle_key(key) {
            outcomes.push(session.synchronize(&ticket, sink));
        }
    }
    outcomes
}

/// Like [`type_keys`], but a real engine may still be processing input when
/// it is read back, so the last command is re-synchronized until the attempt
/// clears or `timeout` passes.
pub fn type_keys_and_settle<E: Engine>(
    session: &mut SessionController<E>,
    keys: &[&str],
    sink: &mut dyn ResultSink,
    timeout: Duration,
) {
    let mut last = None;
    for key in keys {
        if let Some(ticket) = session.handle_key(key) {
            session.synchronize(&ticket, sink);
            last = Some(ticket);
        }
    }
    let Some(ticket) = last else {
        return;
    };
    let deadline = Instant::now() + timeout;
    while !session.is_cleared() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
        session.synchronize(&ticket, sink);
    }
}

/// The Neovim binary to test against, if engine tests are enabled.
pub fn nvim_path() -> Option<String> {
    match std::env::var(NVIM_ENV) {
        Ok(value) if value == "1" || value == "true" => Some("nvim".to_string()),
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
