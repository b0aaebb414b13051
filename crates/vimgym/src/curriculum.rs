//! Track/level ordering and unlock rules over a loaded puzzle set.
//!
//! Levels are numbered globally: level 3 follows level 2 even when they
//! belong to different tracks.

use crate::progress::ProgressStore;
use crate::puzzle::{Puzzle, StarRating};

/// Distinct track numbers, ascending.
pub fn tracks(puzzles: &[Puzzle]) -> Vec<u32> {
    let mut tracks: Vec<u32> = puzzles.iter().map(|p| p.track).collect();
    tracks.sort_unstable();
    tracks.dedup();
    tracks
}

/// Distinct levels within a track, ascending.
pub fn levels_for_track(puzzles: &[Puzzle], track: u32) -> Vec<u32> {
    let mut levels: Vec<u32> = puzzles
        .iter()
        .filter(|p| p.track == track)
        .map(|p| p.level)
        .collect();
    levels.sort_unstable();
    levels.dedup();
    levels
}

/// Puzzles of one level, in catalogue order.
pub fn puzzles_for_level(puzzles: &[Puzzle], level: u32) -> Vec<&Puzzle> {
    puzzles.iter().filter(|p| p.level == level).collect()
}

pub fn find<'a>(puzzles: &'a [Puzzle], id: &str) -> Option<&'a Puzzle> {
    puzzles.iter().find(|p| p.id == id)
}

/// The puzzle after `current` within the same level, if any.
pub fn next_puzzle_in_level<'a>(puzzles: &'a [Puzzle], current: &Puzzle) -> Option<&'a Puzzle> {
    let level = puzzles_for_level(puzzles, current.level);
    let index = level.iter().position(|p| p.id == current.id)?;
    level.get(index + 1).copied()
}

/// The first unlocked puzzle without a result, in catalogue order.
pub fn next_unsolved<'a>(puzzles: &'a [Puzzle], progress: &ProgressStore) -> Option<&'a Puzzle> {
    puzzles
        .iter()
        .find(|p| progress.best(&p.id).is_none() && is_level_unlocked(puzzles, progress, p.level))
}

/// Level 1 is always open; any other level opens once every puzzle of the
/// previous level has at least one star. A gap in the numbering opens it too.
pub fn is_level_unlocked(puzzles: &[Puzzle], progress: &ProgressStore, level: u32) -> bool {
    if level <= 1 {
        return true;
    }
    puzzles_for_level(puzzles, level - 1)
        .iter()
        .all(|p| progress.best(&p.id).is_some())
}

/// The weakest rating across a level, or `None` if the level is empty or any
/// puzzle in it has not been cleared.
pub fn level_stars(puzzles: &[Puzzle], progress: &ProgressStore, level: u32) -> Option<StarRating> {
    let level = puzzles_for_level(puzzles, level);
    if level.is_empty() {
        return None;
    }
    level
        .iter()
        .map(|p| progress.best(&p.id).map(|r| r.stars))
        .min()
        .flatten()
}

/// The best level rating within a track.
pub fn track_stars(puzzles: &[Puzzle], progress: &ProgressStore, track: u32) -> Option<StarRating> {
    levels_for_track(puzzles, track)
        .into_iter()
        .filter_map(|level| level_stars(puzzles, progress, level))
        .max()
}

/// Solved count, total count and rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overall {
    pub solved: usize,
    pub total: usize,
    pub percent: u32,
}

pub fn overall_progress(puzzles: &[Puzzle], progress: &ProgressStore) -> Overall {
    let total = puzzles.len();
    if total == 0 {
        return Overall::default();
    }
    let solved = puzzles
        .iter()
        .filter(|p| progress.best(&p.id).is_some())
        .count();
    let percent = ((solved as f64) * 100.0 / (total as f64)).round() as u32;
    Overall {
        solved,
        total,
        percent,
    }
}
