//! Turns single key events into complete commands for the engine.
//!
//! In normal mode Vim commands span several keys (`4w`, `diw`, `ct)`). The
//! sequencer buffers keys until a command is complete and then dispatches the
//! whole string at once, so the engine never sees half a command while the
//! caller is still predicting the mode. Outside normal mode every key is
//! forwarded on its own.
//!
//! Every accepted key counts as one keystroke, whether it was buffered or
//! dispatched, regardless of the length of the command string it ends up in.

use tracing::debug;

use super::grammar::{is_digit, Grammar, ESC};
use super::mode::{ModeEstimate, VimMode};

/// A partially typed multi-key command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingCommand {
    /// Nothing buffered.
    #[default]
    Idle,
    /// A leading repeat count (`4` in `4w`).
    Count { digits: String },
    /// An operator waiting for its motion or text object.
    Operator {
        /// Leading count plus the operator key (`3d`).
        prefix: String,
        operator: String,
        /// Digits typed after the operator (`2` in `d2w`).
        count: String,
    },
    /// Waiting for exactly one more key (`fx`, `rb`, `dt)`).
    Char {
        keys: String,
        /// The operator this started from, if any.
        operator: Option<String>,
    },
    /// An operator waiting for a text-object selector after `i`/`a`.
    TextObject { keys: String, operator: String },
}

/// Who a buffered count belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountOwner {
    /// A repeat count typed before anything else.
    Leading,
    /// A count typed after an operator.
    Operator,
}

impl PendingCommand {
    /// The keys accumulated so far.
    pub fn keys(&self) -> String {
        match self {
            PendingCommand::Idle => String::new(),
            PendingCommand::Count { digits } => digits.clone(),
            PendingCommand::Operator { prefix, count, .. } => format!("{prefix}{count}"),
            PendingCommand::Char { keys, .. } | PendingCommand::TextObject { keys, .. } => {
                keys.clone()
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PendingCommand::Idle)
    }

    pub fn started_as_operator(&self) -> bool {
        match self {
            PendingCommand::Operator { .. } | PendingCommand::TextObject { .. } => true,
            PendingCommand::Char { operator, .. } => operator.is_some(),
            PendingCommand::Idle | PendingCommand::Count { .. } => false,
        }
    }

    pub fn awaits_char(&self) -> bool {
        matches!(self, PendingCommand::Char { .. })
    }

    pub fn awaits_text_object(&self) -> bool {
        matches!(self, PendingCommand::TextObject { .. })
    }

    pub fn count_owner(&self) -> Option<CountOwner> {
        match self {
            PendingCommand::Count { .. } => Some(CountOwner::Leading),
            PendingCommand::Operator { count, .. } if !count.is_empty() => {
                Some(CountOwner::Operator)
            }
            PendingCommand::Operator { prefix, .. } if prefix.starts_with(|c: char| c.is_ascii_digit()) => {
                Some(CountOwner::Leading)
            }
            _ => None,
        }
    }
}

/// What happened to one key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The key was buffered as part of an incomplete command.
    Buffered,
    /// A complete command to forward to the engine.
    Dispatch(String),
    /// The key carried nothing and was dropped.
    Ignored,
}

impl Step {
    /// Keystrokes this key event adds to the score.
    pub fn keystrokes(&self) -> u32 {
        match self {
            Step::Buffered | Step::Dispatch(_) => 1,
            Step::Ignored => 0,
        }
    }

    pub fn command(&self) -> Option<&str> {
        match self {
            Step::Dispatch(command) => Some(command),
            _ => None,
        }
    }
}

/// Key-to-command sequencer with local mode prediction.
#[derive(Debug, Clone)]
pub struct Sequencer {
    grammar: Grammar,
    pending: PendingCommand,
    estimate: ModeEstimate,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(Grammar::vim())
    }
}

impl Sequencer {
    pub fn new(grammar: Grammar) -> Self {
        Self {
            grammar,
            pending: PendingCommand::Idle,
            estimate: ModeEstimate::default(),
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn pending(&self) -> &PendingCommand {
        &self.pending
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_idle()
    }

    pub fn mode(&self) -> VimMode {
        self.estimate.mode()
    }

    pub fn estimate(&self) -> ModeEstimate {
        self.estimate
    }

    /// Drops pending keys and assumes normal mode, as after loading a puzzle.
    pub fn reset(&mut self) {
        self.pending = PendingCommand::Idle;
        self.estimate.confirm(VimMode::Normal);
    }

    /// Applies the engine's authoritative mode after a synchronization.
    pub fn sync_mode(&mut self, mode: VimMode) {
        self.estimate.confirm(mode);
    }

    /// Feeds one logical key (`"d"`, `"<Esc>"`, `"<C-v>"`).
    pub fn feed(&mut self, key: &str) -> Step {
        if key.is_empty() {
            return Step::Ignored;
        }

        if key == ESC {
            if self.is_pending() {
                debug!(pending = %self.pending.keys(), "escape cancelled pending command");
            }
            self.pending = PendingCommand::Idle;
            self.estimate.predict(VimMode::Normal);
            return Step::Dispatch(ESC.to_string());
        }

        if !self.estimate.mode().is_normal() {
            if self.is_pending() {
                debug!(
                    pending = %self.pending.keys(),
                    mode = self.estimate.mode().label(),
                    "dropping pending command outside normal mode"
                );
                self.pending = PendingCommand::Idle;
            }
            return Step::Dispatch(key.to_string());
        }

        match std::mem::take(&mut self.pending) {
            PendingCommand::Idle => self.feed_idle(key),
            PendingCommand::Count { digits } => self.feed_count(digits, key),
            PendingCommand::Operator {
                prefix,
                operator,
                count,
            } => self.feed_operator(prefix, operator, count, key),
            PendingCommand::Char { keys, operator } => {
                self.dispatch(format!("{keys}{key}"), operator.as_deref())
            }
            PendingCommand::TextObject { keys, operator } => {
                self.dispatch(format!("{keys}{key}"), Some(&operator))
            }
        }
    }

    fn feed_idle(&mut self, key: &str) -> Step {
        if is_digit(key) {
            // A leading 0 is the "start of line" motion, not a count.
            if key == "0" {
                return self.dispatch(key.to_string(), None);
            }
            return self.buffer(PendingCommand::Count {
                digits: key.to_string(),
            });
        }
        if self.grammar.is_operator(key) {
            return self.buffer(PendingCommand::Operator {
                prefix: key.to_string(),
                operator: key.to_string(),
                count: String::new(),
            });
        }
        if self.grammar.awaits_char(key) {
            return self.buffer(PendingCommand::Char {
                keys: key.to_string(),
                operator: None,
            });
        }
        self.dispatch(key.to_string(), None)
    }

    fn feed_count(&mut self, mut digits: String, key: &str) -> Step {
        if is_digit(key) {
            digits.push_str(key);
            return self.buffer(PendingCommand::Count { digits });
        }
        if self.grammar.is_operator(key) {
            return self.buffer(PendingCommand::Operator {
                prefix: format!("{digits}{key}"),
                operator: key.to_string(),
                count: String::new(),
            });
        }
        if self.grammar.awaits_char(key) {
            return self.buffer(PendingCommand::Char {
                keys: format!("{digits}{key}"),
                operator: None,
            });
        }
        self.dispatch(format!("{digits}{key}"), None)
    }

    fn feed_operator(
        &mut self,
        prefix: String,
        operator: String,
        mut count: String,
        key: &str,
    ) -> Step {
        if key == operator && count.is_empty() {
            return self.dispatch(format!("{prefix}{key}"), Some(&operator));
        }

        if is_digit(key) {
            if key == "0" && count.is_empty() {
                return self.dispatch(format!("{prefix}{key}"), Some(&operator));
            }
            count.push_str(key);
            return self.buffer(PendingCommand::Operator {
                prefix,
                operator,
                count,
            });
        }

        let keys = format!("{prefix}{count}{key}");
        if self.grammar.is_text_object_prefix(key) {
            return self.buffer(PendingCommand::TextObject { keys, operator });
        }
        if self.grammar.is_motion_prefix(key) {
            return self.buffer(PendingCommand::Char {
                keys,
                operator: Some(operator),
            });
        }
        self.dispatch(keys, Some(&operator))
    }

    fn buffer(&mut self, pending: PendingCommand) -> Step {
        self.pending = pending;
        Step::Buffered
    }

    /// Emits a complete command and predicts the mode it leads to.
    fn dispatch(&mut self, command: String, operator: Option<&str>) -> Step {
        self.pending = PendingCommand::Idle;

        let predicted = match operator {
            Some(op) if self.grammar.enters_insert(op) => Some(VimMode::Insert),
            Some(_) => None,
            None => self.grammar.mode_change(&command),
        };
        if let Some(mode) = predicted {
            self.estimate.predict(mode);
        }

        Step::Dispatch(command)
    }
}
