use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::{Frame, Terminal};
use tracing::debug;

use super::state::{Flow, SyncQueue};
use crate::curriculum::{find, next_puzzle_in_level, overall_progress};
use crate::engine::Engine;
use crate::progress::ProgressStore;
use crate::puzzle::Puzzle;
use crate::session::SessionController;
use crate::ui::PuzzleScreen;
use crate::vim::translate_key;

/// Upper bound on how long the loop waits for input before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The interactive puzzle loop.
pub struct App<E: Engine> {
    session: SessionController<E>,
    puzzles: Vec<Puzzle>,
    progress: ProgressStore,
    syncs: SyncQueue,
    show_hint: bool,
    show_solution: bool,
}

impl<E: Engine> App<E> {
    pub fn new(
        session: SessionController<E>,
        puzzles: Vec<Puzzle>,
        progress: ProgressStore,
        sync_delay: Duration,
    ) -> Self {
        Self {
            session,
            puzzles,
            progress,
            syncs: SyncQueue::new(sync_delay),
            show_hint: false,
            show_solution: false,
        }
    }

    /// Opens the puzzle with the given id.
    pub fn start(&mut self, puzzle_id: &str, now: Instant) -> Result<()> {
        let puzzle = find(&self.puzzles, puzzle_id)
            .cloned()
            .with_context(|| format!("No puzzle with id {puzzle_id}"))?;
        self.begin(puzzle, now);
        Ok(())
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let size = terminal.size()?;
        self.session.resize(size.width, size.height);

        loop {
            self.process_due(Instant::now());
            terminal.draw(|frame| self.draw(frame))?;

            let timeout = self
                .syncs
                .time_until_next(Instant::now())
                .map_or(POLL_INTERVAL, |d| d.min(POLL_INTERVAL));
            if !event::poll(timeout)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.on_key(key, Instant::now()) != Flow::Continue {
                        break;
                    }
                }
                Event::Resize(width, height) => self.session.resize(width, height),
                _ => {}
            }
        }

        self.session.close();
        Ok(())
    }

    /// Runs every synchronization that is due, oldest first.
    pub fn process_due(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        while let Some(ticket) = self.syncs.pop_due(now) {
            let outcome = self.session.synchronize(&ticket, &mut self.progress);
            debug!(?outcome, "synchronized");
            ran += 1;
        }
        ran
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        if self.session.is_cleared() {
            return match key.code {
                KeyCode::Enter => self.advance(now),
                KeyCode::Char('r') => {
                    self.retry(now);
                    Flow::Continue
                }
                KeyCode::Char('q') | KeyCode::Esc => Flow::Leave,
                _ => Flow::Continue,
            };
        }

        if ctrl {
            match key.code {
                KeyCode::Char('q') => return Flow::Leave,
                KeyCode::Char('r') => {
                    self.retry(now);
                    return Flow::Continue;
                }
                KeyCode::Char('h') => {
                    self.show_hint = !self.show_hint;
                    return Flow::Continue;
                }
                KeyCode::Char('o') => {
                    self.show_solution = !self.show_solution;
                    return Flow::Continue;
                }
                _ => {}
            }
        }

        if let Some(name) = translate_key(key) {
            if let Some(ticket) = self.session.handle_key(&name) {
                self.syncs.push(now, ticket);
            }
        }
        Flow::Continue
    }

    pub fn draw(&self, frame: &mut Frame) {
        let Some(puzzle) = self.session.puzzle() else {
            return;
        };
        let pending = self.session.pending_keys();
        let screen = PuzzleScreen {
            puzzle,
            lines: self.session.lines(),
            cursor: self.session.cursor(),
            mode: self.session.mode(),
            pending: &pending,
            keystrokes: self.session.keystrokes(),
            rating: self.session.current_result().rating,
            show_hint: self.show_hint,
            show_solution: self.show_solution,
            overall: overall_progress(&self.puzzles, &self.progress),
        };
        frame.render_widget(screen, frame.area());
    }

    pub fn session(&self) -> &SessionController<E> {
        &self.session
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn pending_syncs(&self) -> usize {
        self.syncs.len()
    }

    pub fn show_hint(&self) -> bool {
        self.show_hint
    }

    pub fn show_solution(&self) -> bool {
        self.show_solution
    }

    fn begin(&mut self, puzzle: Puzzle, now: Instant) {
        self.syncs.clear();
        self.show_hint = false;
        self.show_solution = false;
        if let Some(ticket) = self.session.start_puzzle(puzzle) {
            self.syncs.push(now, ticket);
        }
    }

    fn retry(&mut self, now: Instant) {
        self.syncs.clear();
        self.show_hint = false;
        self.show_solution = false;
        if let Some(ticket) = self.session.reset() {
            self.syncs.push(now, ticket);
        }
    }

    /// Moves to the next puzzle in the level, or leaves after the last one.
    fn advance(&mut self, now: Instant) -> Flow {
        let next = self
            .session
            .puzzle()
            .and_then(|current| next_puzzle_in_level(&self.puzzles, current))
            .cloned();
        match next {
            Some(puzzle) => {
                self.begin(puzzle, now);
                Flow::Continue
            }
            None => Flow::Leave,
        }
    }
}
