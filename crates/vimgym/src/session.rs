//! One puzzle attempt: keys in, engine round-trips, completion and scoring.
//!
//! The controller never blocks on the engine between keys. Every dispatched
//! command returns a [`SyncTicket`]; the caller runs [`SessionController::synchronize`]
//! with it a short moment later, in dispatch order. Tickets issued before the
//! last start, reset or abandon are stale and are discarded on arrival.

use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::logging::KEYS_TARGET;
use crate::progress::{PuzzleResult, ResultSink};
use crate::puzzle::{is_complete, score, CursorPos, Puzzle, StarRating};
use crate::vim::{Grammar, ModeEstimate, Sequencer, Step, VimMode, ESC};

/// Identifies the attempt a synchronization was scheduled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTicket {
    generation: u64,
    puzzle_id: String,
}

impl SyncTicket {
    pub fn puzzle_id(&self) -> &str {
        &self.puzzle_id
    }
}

/// What a synchronization did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The ticket belonged to an earlier attempt; nothing was read.
    Stale,
    /// The engine could not be read; state is unchanged.
    Failed,
    /// Buffer, cursor and mode were refreshed.
    Updated,
    /// The goal was reached on this synchronization.
    Cleared(PuzzleResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// No puzzle loaded.
    Idle,
    Playing,
    Cleared(StarRating),
}

/// Rating (once cleared) and keystrokes so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentResult {
    pub rating: Option<StarRating>,
    pub keystrokes: u32,
}

pub struct SessionController<E: Engine> {
    engine: E,
    sequencer: Sequencer,
    puzzle: Option<Puzzle>,
    state: AttemptState,
    keystrokes: u32,
    generation: u64,
    lines: Vec<String>,
    cursor: CursorPos,
}

impl<E: Engine> SessionController<E> {
    pub fn new(engine: E, grammar: Grammar) -> Self {
        Self {
            engine,
            sequencer: Sequencer::new(grammar),
            puzzle: None,
            state: AttemptState::Idle,
            keystrokes: 0,
            generation: 0,
            lines: Vec::new(),
            cursor: CursorPos::default(),
        }
    }

    /// Starts a fresh attempt at `puzzle`.
    ///
    /// Returns the ticket for the initial read-back, or `None` if the engine
    /// refused the load.
    pub fn start_puzzle(&mut self, puzzle: Puzzle) -> Option<SyncTicket> {
        self.generation += 1;
        self.keystrokes = 0;
        self.sequencer.reset();
        self.state = AttemptState::Playing;
        self.lines = puzzle.before.text.split('\n').map(str::to_string).collect();
        self.cursor = puzzle.before.cursor;

        debug!(puzzle = %puzzle.id, generation = self.generation, "starting puzzle");
        let loaded = self
            .engine
            .load(&puzzle.before.text, puzzle.before.cursor)
            .and_then(|()| self.engine.send_keys(ESC));
        let puzzle_id = puzzle.id.clone();
        self.puzzle = Some(puzzle);

        if let Err(e) = loaded {
            warn!(puzzle = %puzzle_id, "Failed to load puzzle into engine: {e:#}");
            return None;
        }
        Some(self.ticket(puzzle_id))
    }

    /// Restarts the current puzzle. Stored best results are untouched.
    pub fn reset(&mut self) -> Option<SyncTicket> {
        let puzzle = self.puzzle.clone()?;
        self.start_puzzle(puzzle)
    }

    /// Leaves the current attempt. Pending synchronizations become stale.
    pub fn abandon(&mut self) {
        if let Some(puzzle) = &self.puzzle {
            debug!(puzzle = %puzzle.id, "abandoning puzzle");
        }
        self.generation += 1;
        self.puzzle = None;
        self.state = AttemptState::Idle;
        self.keystrokes = 0;
        self.sequencer.reset();
        self.lines.clear();
        self.cursor = CursorPos::default();
    }

    /// Feeds one normalized key.
    ///
    /// Returns a ticket when a command was sent to the engine. Keys are
    /// ignored unless an attempt is in progress.
    pub fn handle_key(&mut self, key: &str) -> Option<SyncTicket> {
        if self.state != AttemptState::Playing {
            debug!(target: KEYS_TARGET, key, state = ?self.state, "key ignored");
            return None;
        }

        let mode = self.sequencer.mode();
        let step = self.sequencer.feed(key);
        self.keystrokes += step.keystrokes();
        debug!(
            target: KEYS_TARGET,
            key,
            mode = mode.label(),
            step = ?step,
            pending = %self.sequencer.pending().keys(),
            keystrokes = self.keystrokes,
            "key"
        );

        let Step::Dispatch(command) = step else {
            return None;
        };
        if let Err(e) = self.engine.send_keys(&command) {
            warn!(command = %command, "Failed to send keys to engine: {e:#}");
            return None;
        }

        let puzzle_id = self.puzzle.as_ref()?.id.clone();
        Some(self.ticket(puzzle_id))
    }

    /// Reads the engine back and checks for completion.
    ///
    /// A clear is scored and offered to `sink` exactly once per attempt.
    pub fn synchronize(&mut self, ticket: &SyncTicket, sink: &mut dyn ResultSink) -> SyncOutcome {
        let current = self.puzzle.as_ref().map(|p| p.id.as_str());
        if ticket.generation != self.generation || current != Some(ticket.puzzle_id.as_str()) {
            debug!(
                puzzle = %ticket.puzzle_id,
                generation = ticket.generation,
                "discarding stale synchronization"
            );
            return SyncOutcome::Stale;
        }

        let lines = match self.engine.lines() {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Failed to read engine buffer: {e:#}");
                return SyncOutcome::Failed;
            }
        };
        match self.engine.cursor() {
            Ok(cursor) => self.cursor = cursor,
            Err(e) => warn!("Failed to read engine cursor: {e:#}"),
        }
        match self.engine.mode() {
            Ok(token) => self.sequencer.sync_mode(VimMode::from_engine_token(&token)),
            Err(e) => warn!("Failed to read engine mode: {e:#}"),
        }
        self.lines = lines;

        if self.state != AttemptState::Playing {
            return SyncOutcome::Updated;
        }
        let Some(puzzle) = &self.puzzle else {
            return SyncOutcome::Updated;
        };
        if !is_complete(&self.lines.join("\n"), &puzzle.after.text) {
            return SyncOutcome::Updated;
        }

        let rating = score(self.keystrokes, puzzle.par());
        let result = PuzzleResult::new(rating, self.keystrokes);
        self.state = AttemptState::Cleared(rating);
        info!(
            puzzle = %puzzle.id,
            stars = rating.stars(),
            keystrokes = self.keystrokes,
            par = puzzle.par(),
            "puzzle cleared"
        );
        if let Err(e) = sink.record(&puzzle.id, result) {
            warn!(puzzle = %puzzle.id, "Failed to save result: {e:#}");
        }
        SyncOutcome::Cleared(result)
    }

    /// Passes the visible editor size on to the engine.
    pub fn resize(&mut self, width: u16, height: u16) {
        if let Err(e) = self.engine.resize(width, height) {
            debug!("Failed to resize engine: {e:#}");
        }
    }

    /// Shuts the engine down.
    pub fn close(&mut self) {
        self.abandon();
        if let Err(e) = self.engine.close() {
            warn!("Failed to close engine: {e:#}");
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self.state, AttemptState::Cleared(_))
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn current_result(&self) -> CurrentResult {
        let rating = match self.state {
            AttemptState::Cleared(rating) => Some(rating),
            _ => None,
        };
        CurrentResult {
            rating,
            keystrokes: self.keystrokes,
        }
    }

    pub fn keystrokes(&self) -> u32 {
        self.keystrokes
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    /// The buffer as of the last synchronization.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> CursorPos {
        self.cursor
    }

    pub fn mode(&self) -> ModeEstimate {
        self.sequencer.estimate()
    }

    /// Keys buffered for an incomplete command.
    pub fn pending_keys(&self) -> String {
        self.sequencer.pending().keys()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn ticket(&self, puzzle_id: String) -> SyncTicket {
        SyncTicket {
            generation: self.generation,
            puzzle_id,
        }
    }
}
