//! Loop-level state that is not part of a puzzle attempt.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::session::SyncTicket;

/// Synchronizations waiting for their due time, in dispatch order.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    delay: Duration,
    pending: VecDeque<(Instant, SyncTicket)>,
}

impl SyncQueue {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: VecDeque::new(),
        }
    }

    /// Schedules `ticket` one delay after `now`.
    pub fn push(&mut self, now: Instant, ticket: SyncTicket) {
        self.pending.push_back((now + self.delay, ticket));
    }

    /// Takes the oldest ticket if it is due.
    pub fn pop_due(&mut self, now: Instant) -> Option<SyncTicket> {
        match self.pending.front() {
            Some((due, _)) if *due <= now => self.pending.pop_front().map(|(_, t)| t),
            _ => None,
        }
    }

    /// Time until the oldest ticket is due, if any are queued.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.pending
            .front()
            .map(|(due, _)| due.saturating_duration_since(now))
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// What the player asked for with the last key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Leave the puzzle screen.
    Leave,
    /// Quit immediately.
    Quit,
}
