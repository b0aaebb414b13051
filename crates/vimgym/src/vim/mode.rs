//! Vim editing modes and the sequencer's local belief about the current one.

/// The editing mode of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VimMode {
    /// Normal mode - navigation and commands.
    #[default]
    Normal,
    /// Insert mode - text input.
    Insert,
    /// Replace mode (`R`).
    Replace,
    /// Characterwise visual selection.
    Visual,
    /// Linewise visual selection.
    VisualLine,
    /// Blockwise visual selection.
    VisualBlock,
    /// Command-line, search prompt, or any prompt the engine is waiting on.
    CommandLine,
}

impl VimMode {
    /// Maps a `mode()` token reported by the engine.
    ///
    /// Operator-pending (`no`, `nov`, ...) still reads as normal. Select modes
    /// count as their visual counterparts. Anything unrecognised is treated as
    /// a prompt, so keys are forwarded one by one instead of being buffered.
    pub fn from_engine_token(token: &str) -> Self {
        match token {
            "s" => VimMode::Visual,
            "S" => VimMode::VisualLine,
            "\u{13}" => VimMode::VisualBlock,
            "t" => VimMode::Insert,
            _ if token.starts_with('v') => VimMode::Visual,
            _ if token.starts_with('V') => VimMode::VisualLine,
            _ if token.starts_with('\u{16}') => VimMode::VisualBlock,
            _ if token.starts_with('n') => VimMode::Normal,
            _ if token.starts_with('i') => VimMode::Insert,
            _ if token.starts_with('R') => VimMode::Replace,
            _ => VimMode::CommandLine,
        }
    }

    /// Parses a mode name as written in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "normal" => Some(VimMode::Normal),
            "insert" => Some(VimMode::Insert),
            "replace" => Some(VimMode::Replace),
            "visual" => Some(VimMode::Visual),
            "visual_line" | "v_line" => Some(VimMode::VisualLine),
            "visual_block" | "v_block" => Some(VimMode::VisualBlock),
            "command" | "command_line" | "cmdline" => Some(VimMode::CommandLine),
            _ => None,
        }
    }

    /// Returns true if in normal mode.
    pub fn is_normal(&self) -> bool {
        matches!(self, VimMode::Normal)
    }

    /// Returns the mode name for display.
    pub fn label(&self) -> &'static str {
        match self {
            VimMode::Normal => "NORMAL",
            VimMode::Insert => "INSERT",
            VimMode::Replace => "REPLACE",
            VimMode::Visual => "VISUAL",
            VimMode::VisualLine => "V-LINE",
            VimMode::VisualBlock => "V-BLOCK",
            VimMode::CommandLine => "COMMAND",
        }
    }
}

/// Where the current [`ModeEstimate`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSource {
    /// Read back from the engine on the last synchronization.
    Engine,
    /// Predicted locally from a dispatched key; not yet confirmed.
    Predicted,
}

/// The sequencer's belief about the engine's mode.
///
/// A prediction lives at most until the next synchronization, which always
/// overwrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEstimate {
    mode: VimMode,
    source: ModeSource,
}

impl Default for ModeEstimate {
    fn default() -> Self {
        Self {
            mode: VimMode::Normal,
            source: ModeSource::Engine,
        }
    }
}

impl ModeEstimate {
    pub fn mode(&self) -> VimMode {
        self.mode
    }

    pub fn source(&self) -> ModeSource {
        self.source
    }

    pub fn is_speculative(&self) -> bool {
        self.source == ModeSource::Predicted
    }

    /// Records a local prediction.
    pub fn predict(&mut self, mode: VimMode) {
        self.mode = mode;
        self.source = ModeSource::Predicted;
    }

    /// Overwrites the estimate with the engine's answer.
    pub fn confirm(&mut self, mode: VimMode) {
        self.mode = mode;
        self.source = ModeSource::Engine;
    }
}
