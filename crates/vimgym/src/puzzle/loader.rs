//! Puzzle loading and validation.
//!
//! Puzzle files are JSON arrays of [`Puzzle`]. Every puzzle is validated on
//! load so malformed data never reaches the sequencer or the scorer.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use super::Puzzle;

/// Puzzle files compiled into the binary.
const BUILTIN_FILES: &[(&str, &str)] = &[
    (
        "track1_basics.json",
        include_str!("../../puzzles/track1_basics.json"),
    ),
    (
        "track1_operators.json",
        include_str!("../../puzzles/track1_operators.json"),
    ),
    (
        "track2_text_objects.json",
        include_str!("../../puzzles/track2_text_objects.json"),
    ),
];

/// Reasons a puzzle is rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    #[error("puzzle has an empty id")]
    MissingId,
    #[error("puzzle {id}: par must be positive, got {par}")]
    NonPositivePar { id: String, par: i64 },
    #[error("puzzle {id}: par {par} is too large")]
    ParOutOfRange { id: String, par: i64 },
    #[error("puzzle {id}: goal text is empty")]
    EmptyGoal { id: String },
    #[error("puzzle {id}: cursor {row}:{col} is outside the initial text")]
    CursorOutOfRange { id: String, row: usize, col: usize },
    #[error("duplicate puzzle id: {id}")]
    DuplicateId { id: String },
}

/// Checks a single puzzle.
pub fn validate_puzzle(puzzle: &Puzzle) -> Result<(), PuzzleError> {
    if puzzle.id.trim().is_empty() {
        return Err(PuzzleError::MissingId);
    }
    if puzzle.par <= 0 {
        return Err(PuzzleError::NonPositivePar {
            id: puzzle.id.clone(),
            par: puzzle.par,
        });
    }
    if u32::try_from(puzzle.par).is_err() {
        return Err(PuzzleError::ParOutOfRange {
            id: puzzle.id.clone(),
            par: puzzle.par,
        });
    }
    if puzzle.after.text.is_empty() {
        return Err(PuzzleError::EmptyGoal {
            id: puzzle.id.clone(),
        });
    }

    let cursor = puzzle.before.cursor;
    // Columns are byte offsets, matching what the engine reports.
    let in_range = puzzle
        .before
        .text
        .split('\n')
        .nth(cursor.row)
        .is_some_and(|line| cursor.col <= line.len());
    if !in_range {
        return Err(PuzzleError::CursorOutOfRange {
            id: puzzle.id.clone(),
            row: cursor.row,
            col: cursor.col,
        });
    }

    Ok(())
}

/// Checks a whole catalogue: each puzzle individually plus id uniqueness.
pub fn validate_all(puzzles: &[Puzzle]) -> Result<(), PuzzleError> {
    let mut seen = HashSet::new();
    for puzzle in puzzles {
        validate_puzzle(puzzle)?;
        if !seen.insert(puzzle.id.as_str()) {
            return Err(PuzzleError::DuplicateId {
                id: puzzle.id.clone(),
            });
        }
    }
    Ok(())
}

/// Parses and validates one JSON array of puzzles.
///
/// `source` only appears in error messages.
pub fn parse_puzzles(json: &str, source: &str) -> Result<Vec<Puzzle>> {
    let puzzles: Vec<Puzzle> = serde_json::from_str(json)
        .with_context(|| format!("Failed to parse puzzle file: {source}"))?;
    for puzzle in &puzzles {
        validate_puzzle(puzzle).with_context(|| format!("Invalid puzzle in {source}"))?;
    }
    Ok(puzzles)
}

/// Loads puzzles from a single JSON file.
pub fn load_from_file(path: &Path) -> Result<Vec<Puzzle>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read puzzle file: {}", path.display()))?;
    parse_puzzles(&content, &path.display().to_string())
}

/// Loads every `*.json` file in a directory, in file-name order, and sorts
/// the combined set by track then level.
pub fn load_from_dir(dir: &Path) -> Result<Vec<Puzzle>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read puzzle directory: {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read puzzle directory: {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut all = Vec::new();
    for path in &paths {
        all.extend(load_from_file(path)?);
    }
    finish(all)
}

/// The puzzles shipped with vimgym.
pub fn builtin() -> Result<Vec<Puzzle>> {
    let mut all = Vec::new();
    for (name, content) in BUILTIN_FILES {
        all.extend(parse_puzzles(content, name)?);
    }
    finish(all)
}

/// Merges extra puzzles into a base set, re-validating and re-sorting.
pub fn merge(mut base: Vec<Puzzle>, extra: Vec<Puzzle>) -> Result<Vec<Puzzle>> {
    base.extend(extra);
    finish(base)
}

fn finish(mut puzzles: Vec<Puzzle>) -> Result<Vec<Puzzle>> {
    validate_all(&puzzles)?;
    puzzles.sort_by_key(|p| (p.track, p.level));
    Ok(puzzles)
}
