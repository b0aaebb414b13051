//! Command-line parsing and the non-interactive reports.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::curriculum::{
    is_level_unlocked, level_stars, levels_for_track, overall_progress, puzzles_for_level,
    track_stars, tracks,
};
use crate::progress::ProgressStore;
use crate::puzzle::{Puzzle, StarRating};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Play a puzzle; without an id, the next unsolved one.
    Play(Option<String>),
    List,
    Progress,
    ResetProgress,
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub puzzles_dir: Option<PathBuf>,
    pub debug_keys: bool,
}

/// Parses `env::args()`, including the program name.
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut puzzles_dir = None;
    let mut debug_keys = false;
    let mut positional = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(only(Command::Help)),
            "-V" | "--version" => return Ok(only(Command::Version)),
            "--debug-keys" => debug_keys = true,
            "--puzzles" => {
                let dir = iter.next().context("--puzzles requires a directory")?;
                puzzles_dir = Some(PathBuf::from(dir));
            }
            s if s.starts_with("--puzzles=") => {
                puzzles_dir = Some(PathBuf::from(&s["--puzzles=".len()..]));
            }
            s if s.starts_with('-') => bail!("Unknown option: {s}"),
            s => positional.push(s),
        }
    }

    let command = match positional.as_slice() {
        [] | ["play"] => Command::Play(None),
        ["play", id] => Command::Play(Some((*id).to_string())),
        ["list"] => Command::List,
        ["progress"] => Command::Progress,
        ["reset-progress"] => Command::ResetProgress,
        [other, ..] => bail!("Unexpected argument: {other}"),
    };

    Ok(CliArgs {
        command,
        puzzles_dir,
        debug_keys,
    })
}

fn only(command: Command) -> CliArgs {
    CliArgs {
        command,
        puzzles_dir: None,
        debug_keys: false,
    }
}

fn stars(rating: Option<StarRating>) -> &'static str {
    rating.map_or("   ", StarRating::label)
}

/// The catalogue grouped by track and level, with best results.
pub fn format_list(puzzles: &[Puzzle], progress: &ProgressStore) -> String {
    let mut out = String::new();
    for track in tracks(puzzles) {
        let _ = writeln!(out, "Track {track}");
        for level in levels_for_track(puzzles, track) {
            let lock = if is_level_unlocked(puzzles, progress, level) {
                ""
            } else {
                "  (locked)"
            };
            let _ = writeln!(
                out,
                "  Level {level}  {}{lock}",
                stars(level_stars(puzzles, progress, level))
            );
            for puzzle in puzzles_for_level(puzzles, level)
                .into_iter()
                .filter(|p| p.track == track)
            {
                let best = progress.best(&puzzle.id);
                let keys = best.map_or(String::new(), |r| format!(", best {}", r.keystrokes));
                let _ = writeln!(
                    out,
                    "    {:<12} {}  {} (par {}{keys})",
                    puzzle.id,
                    stars(best.map(|r| r.stars)),
                    puzzle.title,
                    puzzle.par()
                );
            }
        }
    }
    out
}

/// Overall and per-track progress.
pub fn format_progress(puzzles: &[Puzzle], progress: &ProgressStore) -> String {
    let overall = overall_progress(puzzles, progress);
    let mut out = format!(
        "Solved {}/{} puzzles ({}%)\n",
        overall.solved, overall.total, overall.percent
    );
    for track in tracks(puzzles) {
        let _ = writeln!(
            out,
            "  Track {track}  {}",
            stars(track_stars(puzzles, progress, track))
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::PuzzleResult;
    use crate::puzzle::builtin;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("vimgym")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_default_command_is_play() {
        let parsed = parse_args(&args(&[])).unwrap();
        assert_eq!(parsed.command, Command::Play(None));
        assert!(!parsed.debug_keys);
    }

    #[test]
    fn test_play_with_id_and_options() {
        let parsed =
            parse_args(&args(&["--debug-keys", "play", "t1-l1-001", "--puzzles", "/tmp/p"]))
                .unwrap();
        assert_eq!(parsed.command, Command::Play(Some("t1-l1-001".to_string())));
        assert!(parsed.debug_keys);
        assert_eq!(parsed.puzzles_dir, Some(PathBuf::from("/tmp/p")));

        let parsed = parse_args(&args(&["list", "--puzzles=extra"])).unwrap();
        assert_eq!(parsed.command, Command::List);
        assert_eq!(parsed.puzzles_dir, Some(PathBuf::from("extra")));
    }

    #[test]
    fn test_help_and_version_win() {
        assert_eq!(
            parse_args(&args(&["list", "-h"])).unwrap().command,
            Command::Help
        );
        assert_eq!(
            parse_args(&args(&["--version"])).unwrap().command,
            Command::Version
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["--puzzles"])).is_err());
        assert!(parse_args(&args(&["dance"])).is_err());
        assert!(parse_args(&args(&["play", "a", "b"])).is_err());
    }

    #[test]
    fn test_format_list_shows_locks_and_results() {
        let puzzles = builtin().unwrap();
        let mut store = ProgressStore::in_memory();
        store.record_best(&puzzles[0].id, PuzzleResult::new(StarRating::Three, 1));

        let out = format_list(&puzzles, &store);
        assert!(out.starts_with("Track 1\n  Level 1"));
        assert!(out.contains("(locked)"));
        assert!(out.contains(&format!("{:<12} ***", puzzles[0].id)));
        assert!(out.contains(", best 1)"));
    }

    #[test]
    fn test_format_progress() {
        let puzzles = builtin().unwrap();
        let store = ProgressStore::in_memory();
        let out = format_progress(&puzzles, &store);
        assert!(out.starts_with(&format!("Solved 0/{} puzzles (0%)", puzzles.len())));
        assert!(out.contains("Track 2"));
    }
}
