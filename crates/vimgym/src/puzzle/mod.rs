//! Puzzle definitions, loading and the pure scoring/completion rules.
//!
//! A puzzle is an immutable "before -> after" editing exercise. Puzzles are
//! loaded once at startup and shared read-only for the whole run.

mod loader;
mod score;
mod validate;

pub use loader::{
    builtin, load_from_dir, load_from_file, merge, parse_puzzles, validate_all, validate_puzzle,
    PuzzleError,
};
pub use score::{score, StarRating};
pub use validate::is_complete;

use serde::{Deserialize, Serialize};

/// A cursor position (0-indexed row and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorPos {
    pub row: usize,
    pub col: usize,
}

impl CursorPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// The initial state of a puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeforeState {
    pub text: String,
    #[serde(default)]
    pub cursor: CursorPos,
}

/// The goal state of a puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfterState {
    pub text: String,
}

/// A single puzzle as stored in the puzzle JSON files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub id: String,
    pub title: String,
    pub track: u32,
    pub level: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: u32,
    pub before: BeforeState,
    pub after: AfterState,
    pub par: i64,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub optimal_solution: String,
    #[serde(default)]
    pub solution_explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Puzzle {
    /// Par as an unsigned keystroke count.
    ///
    /// Validation keeps par within `1..=u32::MAX`; anything else saturates.
    pub fn par(&self) -> u32 {
        u32::try_from(self.par.max(1)).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_fields() {
        let json = r#"{
            "id": "t1-l1-001",
            "title": "Delete a word",
            "track": 1,
            "level": 1,
            "category": "deletion",
            "difficulty": 1,
            "before": {"text": "foo bar baz", "cursor": {"row": 0, "col": 4}},
            "after": {"text": "foo baz"},
            "par": 3,
            "hint": "Try an operator with a text object",
            "optimalSolution": "daw",
            "solutionExplanation": "daw deletes a word and its trailing space",
            "tags": ["operator", "text-object"]
        }"#;

        let puzzle: Puzzle = serde_json::from_str(json).unwrap();
        assert_eq!(puzzle.id, "t1-l1-001");
        assert_eq!(puzzle.before.cursor, CursorPos::new(0, 4));
        assert_eq!(puzzle.optimal_solution, "daw");
        assert_eq!(
            puzzle.solution_explanation,
            "daw deletes a word and its trailing space"
        );
        assert_eq!(puzzle.par(), 3);
        assert_eq!(puzzle.tags.len(), 2);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "id": "x",
            "title": "Minimal",
            "track": 1,
            "level": 2,
            "before": {"text": "a"},
            "after": {"text": "b"},
            "par": 1
        }"#;

        let puzzle: Puzzle = serde_json::from_str(json).unwrap();
        assert_eq!(puzzle.before.cursor, CursorPos::default());
        assert!(puzzle.hint.is_empty());
        assert!(puzzle.tags.is_empty());
    }

    #[test]
    fn test_par_saturates_instead_of_dropping_to_zero() {
        let json = r#"{
            "id": "x", "title": "t", "track": 1, "level": 1,
            "before": {"text": "a"}, "after": {"text": "b"}, "par": -2
        }"#;
        let mut puzzle: Puzzle = serde_json::from_str(json).unwrap();
        assert_eq!(puzzle.par(), 1);

        puzzle.par = 5_000_000_000;
        assert_eq!(puzzle.par(), u32::MAX);
    }
}
