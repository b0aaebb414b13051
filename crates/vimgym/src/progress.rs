//! Best-result persistence between launches.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::progress_path;
use crate::puzzle::StarRating;

/// Current progress file schema version.
const PROGRESS_VERSION: u32 = 1;

/// Best-known result for one puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleResult {
    pub stars: StarRating,
    pub keystrokes: u32,
}

impl PuzzleResult {
    pub fn new(stars: StarRating, keystrokes: u32) -> Self {
        Self { stars, keystrokes }
    }

    /// True if `self` should replace `existing`: strictly more stars, or the
    /// same stars in fewer keystrokes.
    pub fn improves_on(&self, existing: &PuzzleResult) -> bool {
        self.stars > existing.stars
            || (self.stars == existing.stars && self.keystrokes < existing.keystrokes)
    }
}

/// Receives results of cleared puzzles.
pub trait ResultSink {
    /// Offers a result for `puzzle_id`. Returns true if it became the new best.
    fn record(&mut self, puzzle_id: &str, result: PuzzleResult) -> Result<bool>;
}

/// The progress file format with versioning.
#[derive(Debug, Serialize, Deserialize)]
struct ProgressFile {
    version: u32,
    #[serde(default)]
    results: BTreeMap<String, PuzzleResult>,
}

/// Best results keyed by puzzle id, optionally backed by a file.
#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    path: Option<PathBuf>,
    results: BTreeMap<String, PuzzleResult>,
}

impl ProgressStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load progress from the default path.
    pub fn load() -> Result<Self> {
        let path = progress_path().context("Could not determine progress path")?;
        Self::load_from_path(&path)
    }

    /// Load progress from a specific path.
    ///
    /// A missing file, or one written by a newer version, yields an empty store.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut store = Self {
            path: Some(path.to_path_buf()),
            results: BTreeMap::new(),
        };
        if !path.exists() {
            return Ok(store);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read progress file: {}", path.display()))?;
        let file: ProgressFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse progress file: {}", path.display()))?;

        if file.version > PROGRESS_VERSION {
            debug!(version = file.version, "ignoring progress from a newer version");
            return Ok(store);
        }

        store.results = file.results;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn best(&self, puzzle_id: &str) -> Option<PuzzleResult> {
        self.results.get(puzzle_id).copied()
    }

    pub fn results(&self) -> &BTreeMap<String, PuzzleResult> {
        &self.results
    }

    /// Merges a result in memory. Returns true if it replaced the stored one.
    pub fn record_best(&mut self, puzzle_id: &str, result: PuzzleResult) -> bool {
        let improved = match self.results.get(puzzle_id) {
            Some(existing) => result.improves_on(existing),
            None => true,
        };
        if improved {
            self.results.insert(puzzle_id.to_string(), result);
        }
        improved
    }

    /// Clears every result and persists the empty state.
    pub fn reset(&mut self) -> Result<()> {
        self.results.clear();
        self.save()
    }

    /// Writes the store to its file, if it has one.
    /// Uses atomic write (temp file + rename) to prevent corruption on crash.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let parent = path
            .parent()
            .context("Progress path has no parent directory")?;

        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;

        let file = ProgressFile {
            version: PROGRESS_VERSION,
            results: self.results.clone(),
        };
        let content =
            serde_json::to_string_pretty(&file).context("Failed to serialize progress")?;

        let mut tmp = NamedTempFile::new_in(parent).with_context(|| {
            format!(
                "Failed to create temp progress file in: {}",
                parent.display()
            )
        })?;
        tmp.write_all(content.as_bytes())
            .context("Failed to write temp progress file")?;
        tmp.flush().context("Failed to flush temp progress file")?;
        tmp.persist(path)
            .map_err(|e| anyhow::anyhow!("Failed to persist progress file: {}", e))?;

        Ok(())
    }
}

impl ResultSink for ProgressStore {
    fn record(&mut self, puzzle_id: &str, result: PuzzleResult) -> Result<bool> {
        if !self.record_best(puzzle_id, result) {
            return Ok(false);
        }
        info!(
            puzzle = puzzle_id,
            stars = result.stars.stars(),
            keystrokes = result.keystrokes,
            "new best result"
        );
        self.save()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn result(stars: StarRating, keystrokes: u32) -> PuzzleResult {
        PuzzleResult::new(stars, keystrokes)
    }

    #[test]
    fn test_higher_rating_wins_outright() {
        let mut store = ProgressStore::in_memory();
        store.record_best("p", result(StarRating::Two, 10));

        assert!(store.record_best("p", result(StarRating::Three, 12)));
        assert_eq!(store.best("p"), Some(result(StarRating::Three, 12)));
    }

    #[test]
    fn test_same_rating_needs_fewer_keystrokes() {
        let mut store = ProgressStore::in_memory();
        store.record_best("p", result(StarRating::Two, 10));

        assert!(!store.record_best("p", result(StarRating::Two, 10)));
        assert!(!store.record_best("p", result(StarRating::Two, 11)));
        assert!(store.record_best("p", result(StarRating::Two, 9)));
        assert_eq!(store.best("p"), Some(result(StarRating::Two, 9)));
    }

    #[test]
    fn test_fewer_keystrokes_with_lower_rating_does_not_win() {
        let mut store = ProgressStore::in_memory();
        store.record_best("p", result(StarRating::Two, 10));

        assert!(!store.record_best("p", result(StarRating::One, 7)));
        assert_eq!(store.best("p"), Some(result(StarRating::Two, 10)));
    }

    #[test]
    fn test_first_result_is_always_stored() {
        let mut store = ProgressStore::in_memory();
        assert_eq!(store.best("p"), None);
        assert!(store.record_best("p", result(StarRating::One, 99)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::load_from_path(&dir.path().join("progress.json")).unwrap();
        assert!(store.results().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.json");

        let mut store = ProgressStore::load_from_path(&path).unwrap();
        store.record("a", result(StarRating::Three, 3)).unwrap();
        store.record("b", result(StarRating::One, 20)).unwrap();
        assert!(path.exists());

        let loaded = ProgressStore::load_from_path(&path).unwrap();
        assert_eq!(loaded.best("a"), Some(result(StarRating::Three, 3)));
        assert_eq!(loaded.best("b"), Some(result(StarRating::One, 20)));
    }

    #[test]
    fn test_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let mut store = ProgressStore::load_from_path(&path).unwrap();
        store.record("a", result(StarRating::Two, 5)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["results"]["a"]["stars"], 2);
        assert_eq!(json["results"]["a"]["keystrokes"], 5);
    }

    #[test]
    fn test_record_without_improvement_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let mut store = ProgressStore::load_from_path(&path).unwrap();
        store.record("a", result(StarRating::Three, 3)).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(!store.record("a", result(StarRating::One, 9)).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_reset_clears_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let mut store = ProgressStore::load_from_path(&path).unwrap();
        store.record("a", result(StarRating::Three, 3)).unwrap();

        store.reset().unwrap();
        assert!(store.results().is_empty());
        let loaded = ProgressStore::load_from_path(&path).unwrap();
        assert!(loaded.results().is_empty());
    }

    #[test]
    fn test_corrupted_file_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "not valid json {{{").unwrap();
        assert!(ProgressStore::load_from_path(&path).is_err());
    }

    #[test]
    fn test_invalid_star_value_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(
            &path,
            r#"{"version": 1, "results": {"a": {"stars": 7, "keystrokes": 1}}}"#,
        )
        .unwrap();
        assert!(ProgressStore::load_from_path(&path).is_err());
    }

    #[test]
    fn test_future_version_returns_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(
            &path,
            r#"{"version": 999, "results": {"a": {"stars": 3, "keystrokes": 1}}}"#,
        )
        .unwrap();

        let store = ProgressStore::load_from_path(&path).unwrap();
        assert!(store.results().is_empty());
    }

    #[test]
    fn test_in_memory_store_never_writes() {
        let mut store = ProgressStore::in_memory();
        assert!(store.record("a", result(StarRating::One, 4)).unwrap());
        assert!(store.path().is_none());
        store.reset().unwrap();
    }
}
