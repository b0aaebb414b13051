//! End-to-end puzzle attempts over the built-in catalogue.
//!
//! The scripted engine stands in for Neovim. Set `VIMGYM_TEST_NVIM=1` (or a
//! path to the binary) to also run the attempts against a real Neovim.

mod common;

use std::time::Duration;

use tempfile::tempdir;

use vimgym::config::EngineConfig;
use vimgym::curriculum::{is_level_unlocked, next_unsolved, overall_progress};
use vimgym::engine::{MemoryEngine, NvimEngine, Reaction};
use vimgym::progress::ProgressStore;
use vimgym::puzzle::{builtin, StarRating};
use vimgym::session::{AttemptState, SessionController, SyncOutcome};
use vimgym::vim::{Grammar, VimMode};

use common::{nvim_path, puzzle, start, type_keys, type_keys_and_settle};

fn session(engine: MemoryEngine) -> SessionController<MemoryEngine> {
    SessionController::new(engine, Grammar::vim())
}

#[test]
fn test_operator_and_motion_clear_at_par() {
    let engine = MemoryEngine::new().on("dw", Reaction::text("foo baz"));
    let mut session = session(engine);
    let mut store = ProgressStore::in_memory();

    assert_eq!(
        start(&mut session, puzzle("t1-l2-001"), &mut store),
        SyncOutcome::Updated
    );
    let outcomes = type_keys(&mut session, &["d", "w"], &mut store);

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], SyncOutcome::Cleared(_)));
    assert_eq!(session.engine().sent(), ["<Esc>", "dw"]);
    assert_eq!(session.state(), AttemptState::Cleared(StarRating::Three));
    assert_eq!(store.best("t1-l2-001").map(|r| r.keystrokes), Some(2));
}

#[test]
fn test_change_until_then_typing_in_insert_mode() {
    let engine = MemoryEngine::new()
        .on("ct)", Reaction::text("print()").with_mode("i"))
        .on("n", Reaction::text("print(n)").with_mode("i"))
        .on("e", Reaction::text("print(ne)").with_mode("i"))
        .on("w", Reaction::text("print(new)").with_mode("i"));
    let mut session = session(engine);
    let mut store = ProgressStore::in_memory();
    start(&mut session, puzzle("t1-l2-004"), &mut store);

    type_keys(&mut session, &["c", "t"], &mut store);
    assert_eq!(session.pending_keys(), "ct");

    type_keys(&mut session, &[")"], &mut store);
    assert_eq!(session.mode().mode(), VimMode::Insert);

    let outcomes = type_keys(&mut session, &["n", "e", "w"], &mut store);
    assert!(matches!(outcomes.last(), Some(SyncOutcome::Cleared(_))));
    assert_eq!(session.engine().sent(), ["<Esc>", "ct)", "n", "e", "w"]);
    assert_eq!(session.keystrokes(), 6);
    assert_eq!(session.engine().text(), "print(new)");

    // Keys after the clear go nowhere.
    assert!(session.handle_key("<Esc>").is_none());
    assert_eq!(session.keystrokes(), 6);
}

#[test]
fn test_wandering_costs_stars() {
    let engine = MemoryEngine::new().on("x", Reaction::text("hello"));
    let mut session = session(engine);
    let mut store = ProgressStore::in_memory();
    start(&mut session, puzzle("t1-l1-001"), &mut store);

    type_keys(&mut session, &["h", "l", "x"], &mut store);
    assert_eq!(session.state(), AttemptState::Cleared(StarRating::One));

    // A better retry replaces the stored result.
    session.reset();
    type_keys(&mut session, &["x"], &mut store);
    let best = store.best("t1-l1-001").unwrap();
    assert_eq!(best.stars, StarRating::Three);
    assert_eq!(best.keystrokes, 1);
}

#[test]
fn test_engine_mode_overrides_prediction() {
    let mut session = session(MemoryEngine::new());
    let mut store = ProgressStore::in_memory();
    start(&mut session, puzzle("t1-l2-001"), &mut store);

    // The engine ended up in visual mode without a key predicting it.
    session.engine_mut().set_mode("v");
    type_keys(&mut session, &["l"], &mut store);
    assert_eq!(session.mode().mode(), VimMode::Visual);

    // Outside normal mode operators are forwarded on their own.
    type_keys(&mut session, &["d"], &mut store);
    assert_eq!(session.engine().sent().last().map(String::as_str), Some("d"));
    assert_eq!(session.pending_keys(), "");
}

#[test]
fn test_counted_text_object_is_one_command() {
    let engine = MemoryEngine::new().on("2daw", Reaction::text("gamma"));
    let mut session = session(engine);
    let mut store = ProgressStore::in_memory();
    start(&mut session, puzzle("t2-l3-002"), &mut store);

    let outcomes = type_keys(&mut session, &["2", "d", "a", "w"], &mut store);
    assert_eq!(outcomes, vec![SyncOutcome::Updated]);
    assert_eq!(session.engine().sent().last().map(String::as_str), Some("2daw"));
    assert!(!session.is_cleared());
}

#[test]
fn test_clearing_a_level_unlocks_the_next_and_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    let mut store = ProgressStore::load_from_path(&path).unwrap();
    let puzzles = builtin().unwrap();

    let engine = MemoryEngine::new()
        .on("x", Reaction::text("hello"))
        .on("A", Reaction::mode("i"))
        .on(";", Reaction::text("let total = price * qty;").with_mode("i"))
        .on("o", Reaction::text("first\n\nthird").with_mode("i"))
        .on("d", Reaction::text("first\nsecond\nthird").with_mode("i"))
        .on("rb", Reaction::text("bat"));
    let mut session = session(engine);

    let attempts: [(&str, &[&str]); 4] = [
        ("t1-l1-001", &["x"]),
        ("t1-l1-002", &["A", ";"]),
        ("t1-l1-003", &["o", "s", "e", "c", "o", "n", "d"]),
        ("t1-l1-004", &["r", "b"]),
    ];
    assert!(!is_level_unlocked(&puzzles, &store, 2));
    for (id, keys) in attempts {
        assert_eq!(next_unsolved(&puzzles, &store).map(|p| p.id.as_str()), Some(id));
        start(&mut session, puzzle(id), &mut store);
        type_keys(&mut session, keys, &mut store);
        assert!(session.is_cleared(), "{id} should clear");
    }
    assert!(is_level_unlocked(&puzzles, &store, 2));
    assert_eq!(
        next_unsolved(&puzzles, &store).map(|p| p.id.as_str()),
        Some("t1-l2-001")
    );

    let reloaded = ProgressStore::load_from_path(&path).unwrap();
    assert_eq!(reloaded.results().len(), 4);
    assert_eq!(overall_progress(&puzzles, &reloaded).solved, 4);
    assert!(reloaded
        .results()
        .values()
        .all(|r| r.stars == StarRating::Three));
}

#[test]
fn test_engine_failure_mid_attempt() {
    let engine = MemoryEngine::new().on("dd", Reaction::text("keep\nkeep"));
    let mut session = session(engine);
    let mut store = ProgressStore::in_memory();
    start(&mut session, puzzle("t1-l2-002"), &mut store);

    session.engine_mut().fail_reads(true);
    let outcomes = type_keys(&mut session, &["d", "d"], &mut store);
    assert_eq!(outcomes, vec![SyncOutcome::Failed]);
    assert!(!session.is_cleared());

    // The next read sees the buffer; the failed one cost nothing extra.
    session.engine_mut().fail_reads(false);
    let outcomes = type_keys(&mut session, &["k"], &mut store);
    assert!(matches!(outcomes[0], SyncOutcome::Cleared(_)));
    assert_eq!(session.keystrokes(), 3);
}

fn nvim_session() -> Option<SessionController<NvimEngine>> {
    let Some(path) = nvim_path() else {
        eprintln!("Skipping: {} not set", common::NVIM_ENV);
        return None;
    };
    let config = EngineConfig {
        nvim_path: path,
        ..EngineConfig::default()
    };
    let engine = NvimEngine::spawn(&config).expect("Neovim should start");
    Some(SessionController::new(engine, Grammar::vim()))
}

#[test]
fn test_nvim_operator_puzzles() {
    let Some(mut session) = nvim_session() else {
        return;
    };
    let mut store = ProgressStore::in_memory();
    let timeout = Duration::from_secs(2);

    let attempts: [(&str, &[&str]); 3] = [
        ("t1-l2-001", &["d", "w"]),
        ("t1-l2-003", &["3", "d", "w"]),
        ("t2-l3-001", &["c", "i", "\"", "f", "i", "n", "a", "l", "<Esc>"]),
    ];
    for (id, keys) in attempts {
        start(&mut session, puzzle(id), &mut store);
        type_keys_and_settle(&mut session, keys, &mut store, timeout);
        assert_eq!(
            session.state(),
            AttemptState::Cleared(StarRating::Three),
            "{id} should clear at par, buffer: {:?}",
            session.lines()
        );
    }
    session.close();
}

#[test]
fn test_nvim_reset_restores_the_buffer() {
    let Some(mut session) = nvim_session() else {
        return;
    };
    let mut store = ProgressStore::in_memory();

    start(&mut session, puzzle("t1-l2-002"), &mut store);
    type_keys_and_settle(&mut session, &["G", "d", "d"], &mut store, Duration::from_millis(200));
    assert!(!session.is_cleared());

    let ticket = session.reset().expect("reset should reload");
    session.synchronize(&ticket, &mut store);
    assert_eq!(session.lines(), ["keep", "drop", "keep"]);
    assert_eq!(session.keystrokes(), 0);

    // Undo history starts at the loaded text.
    type_keys_and_settle(&mut session, &["u"], &mut store, Duration::from_millis(200));
    assert_eq!(session.lines(), ["keep", "drop", "keep"]);
    session.close();
}
