use std::env;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use vimgym::app::App;
use vimgym::cli::{self, CliArgs, Command};
use vimgym::config::{self, Config};
use vimgym::curriculum::{find, is_level_unlocked, next_unsolved};
use vimgym::engine::NvimEngine;
use vimgym::logging::init_logging;
use vimgym::progress::ProgressStore;
use vimgym::puzzle::{self, Puzzle};
use vimgym::session::SessionController;
use vimgym::vim::Grammar;

fn print_version() {
    println!("vimgym {}", env!("CARGO_PKG_VERSION"));
}

fn print_usage() {
    eprintln!("vimgym - Keystroke-golf puzzles for Vim, played in a real Neovim");
    eprintln!();
    eprintln!("Usage: vimgym [OPTIONS] [COMMAND]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  play [PUZZLE_ID]  Play a puzzle (default: the next unsolved one)");
    eprintln!("  list              List puzzles with their best results");
    eprintln!("  progress          Show overall progress");
    eprintln!("  reset-progress    Forget every recorded result");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -h, --help           Print this help message");
    eprintln!("  -V, --version        Print version information");
    eprintln!("      --puzzles <DIR>  Also load puzzles from DIR");
    eprintln!("      --debug-keys     Log every key decision");
    eprintln!();
    eprintln!("In a puzzle:");
    eprintln!("  Ctrl+H  Toggle hint       Ctrl+O  Toggle solution");
    eprintln!("  Ctrl+R  Restart           Ctrl+Q  Leave");
    eprintln!();
    eprintln!("Environment Variables:");
    eprintln!("  {}  Override the config directory", config::CONFIG_DIR_ENV);
    eprintln!("  {}  Log every key decision", config::DEBUG_KEYS_ENV);
    eprintln!("  RUST_LOG           Override the log filter");
    eprintln!();
    eprintln!("Configuration:");
    if let Some(path) = config::config_path() {
        eprintln!("  Config file: {}", path.display());
    }
    if let Some(path) = config::progress_path() {
        eprintln!("  Progress:    {}", path.display());
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let CliArgs {
        command,
        puzzles_dir,
        debug_keys,
    } = match cli::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    match command {
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Version => {
            print_version();
            return Ok(());
        }
        _ => {}
    }

    // Load configuration from ~/.config/vimgym/config.toml
    let mut cfg = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        Config::default()
    });
    cfg.logging.debug_keys |= debug_keys;

    // The puzzle screen owns the terminal, so play logs to a file.
    let log_file = match command {
        Command::Play(_) => cfg.logging.file.clone().or_else(config::log_path),
        _ => None,
    };
    if let Err(e) = init_logging(&cfg.logging.level, cfg.logging.debug_keys, log_file.as_deref())
    {
        eprintln!("Warning: {e}");
    }

    let puzzles = load_puzzles(puzzles_dir.or_else(|| cfg.puzzles.dir.clone()))?;

    let mut progress = ProgressStore::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load progress: {}", e);
        ProgressStore::in_memory()
    });

    match command {
        Command::List => print!("{}", cli::format_list(&puzzles, &progress)),
        Command::Progress => print!("{}", cli::format_progress(&puzzles, &progress)),
        Command::ResetProgress => {
            progress.reset()?;
            println!("Progress reset.");
        }
        Command::Play(id) => play(&cfg, puzzles, progress, id)?,
        Command::Help | Command::Version => {}
    }
    Ok(())
}

fn load_puzzles(extra_dir: Option<std::path::PathBuf>) -> Result<Vec<Puzzle>> {
    let builtin = puzzle::builtin().context("Built-in puzzles are invalid")?;
    match extra_dir {
        Some(dir) => {
            let extra = puzzle::load_from_dir(&dir)
                .with_context(|| format!("Failed to load puzzles from {}", dir.display()))?;
            info!(count = extra.len(), dir = %dir.display(), "loaded extra puzzles");
            puzzle::merge(builtin, extra)
        }
        None => Ok(builtin),
    }
}

fn play(
    cfg: &Config,
    puzzles: Vec<Puzzle>,
    progress: ProgressStore,
    id: Option<String>,
) -> Result<()> {
    let puzzle_id = match id {
        Some(id) => {
            let puzzle = find(&puzzles, &id).with_context(|| format!("No puzzle with id {id}"))?;
            if !is_level_unlocked(&puzzles, &progress, puzzle.level) {
                bail!(
                    "Level {} is locked; clear every puzzle of level {} first",
                    puzzle.level,
                    puzzle.level.saturating_sub(1)
                );
            }
            id
        }
        None => match next_unsolved(&puzzles, &progress).or(puzzles.first()) {
            Some(puzzle) => puzzle.id.clone(),
            None => bail!("No puzzles available"),
        },
    };

    let grammar = Grammar::from_config(&cfg.grammar).context("Invalid [grammar] config")?;
    let engine = NvimEngine::spawn(&cfg.engine).with_context(|| {
        format!(
            "Failed to start Neovim ({}); is it installed?",
            cfg.engine.nvim_path
        )
    })?;
    let session = SessionController::new(engine, grammar);
    let mut app = App::new(
        session,
        puzzles,
        progress,
        Duration::from_millis(cfg.engine.sync_delay_ms),
    );
    app.start(&puzzle_id, Instant::now())?;

    let mut terminal =
        init_terminal().context("failed to initialize terminal; are you running in a real TTY?")?;

    let res = app.run(&mut terminal);

    restore_terminal(terminal)?;

    if let Err(e) = &res {
        warn!(error = %e, "session ended with an error");
    }
    res
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
