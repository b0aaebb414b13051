//! Neovim engine.
//!
//! Starts `nvim --headless --listen <socket>` and talks to it through Neovim's
//! own remote client (`--server <socket> --remote-send/--remote-expr`). Every
//! call is a short-lived process bounded by `call_timeout_ms`.
//!
//! Key sends are handed to a background task over a channel and return
//! immediately; the task runs them one at a time in the order they were
//! queued. Reads first wait for that queue to drain, so a read always sees
//! every key sent before it.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use super::Engine;
use crate::config::EngineConfig;
use crate::puzzle::CursorPos;

const SOCKET_NAME: &str = "nvim.sock";
const STARTUP_POLL: Duration = Duration::from_millis(20);
const SETUP_COMMANDS: &str =
    "set noswapfile nobackup nowritebackup noundofile shortmess+=I";
const UNDO_LEVELS: u32 = 1000;

/// Work for the background send task.
enum Outgoing {
    Keys(String),
    /// Answered once every earlier `Keys` has been delivered.
    Flush(oneshot::Sender<()>),
}

/// How to reach the running editor.
#[derive(Debug, Clone)]
struct Remote {
    nvim_path: String,
    socket: PathBuf,
    timeout: Duration,
}

impl Remote {
    async fn call(&self, flag: &str, arg: &str) -> Result<String> {
        let mut command = Command::new(&self.nvim_path);
        command
            .arg("--headless")
            .arg("--server")
            .arg(&self.socket)
            .arg(flag)
            .arg(arg)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| anyhow!("nvim {flag} timed out after {}ms", self.timeout.as_millis()))?
            .with_context(|| format!("Failed to run nvim {flag}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("nvim {flag} failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = stdout.trim_end_matches(['\r', '\n']).to_string();
        trace!(flag, arg, result = %result, "nvim call");
        Ok(result)
    }
}

/// Delivers queued keys in order. A failed send drops that command only.
async fn send_loop(remote: Remote, mut rx: mpsc::UnboundedReceiver<Outgoing>) {
    while let Some(item) = rx.recv().await {
        match item {
            Outgoing::Keys(keys) => {
                if let Err(e) = remote.call("--remote-send", &keys).await {
                    warn!(keys = %keys, "Failed to send keys to nvim: {e:#}");
                }
            }
            Outgoing::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

pub struct NvimEngine {
    remote: Remote,
    // Holds the socket directory alive.
    _dir: TempDir,
    child: Option<Child>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    runtime: Runtime,
}

impl NvimEngine {
    /// Starts Neovim and waits until its socket answers.
    pub fn spawn(config: &EngineConfig) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("vimgym-")
            .tempdir()
            .context("Failed to create engine socket directory")?;
        let socket = dir.path().join(SOCKET_NAME);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .context("Failed to initialize tokio runtime")?;

        let child = {
            let _guard = runtime.enter();
            Command::new(&config.nvim_path)
                .args(["--headless", "--clean", "-n", "--listen"])
                .arg(&socket)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| format!("Failed to start {}", config.nvim_path))?
        };
        debug!(path = %config.nvim_path, socket = %socket.display(), "started nvim");

        let remote = Remote {
            nvim_path: config.nvim_path.clone(),
            socket,
            timeout: Duration::from_millis(config.call_timeout_ms.max(1)),
        };
        let (outgoing, rx) = mpsc::unbounded_channel();
        runtime.spawn(send_loop(remote.clone(), rx));

        let mut engine = Self {
            remote,
            _dir: dir,
            child: Some(child),
            outgoing,
            runtime,
        };

        engine.wait_ready(Duration::from_millis(config.startup_timeout_ms))?;
        engine.eval(&format!("execute('{SETUP_COMMANDS}')"))?;
        engine.resize(config.width, config.height)?;
        Ok(engine)
    }

    fn wait_ready(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            self.check_alive()?;
            if self.remote.socket.exists() && self.eval("1").is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!(
                    "nvim did not start listening within {}ms",
                    timeout.as_millis()
                );
            }
            std::thread::sleep(STARTUP_POLL);
        }
    }

    fn check_alive(&mut self) -> Result<()> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| anyhow!("engine is closed"))?;
        if let Some(status) = child.try_wait().context("Failed to poll nvim")? {
            self.child = None;
            bail!("nvim exited unexpectedly: {status}");
        }
        Ok(())
    }

    fn queue(&mut self, keys: &str) -> Result<()> {
        self.check_alive()?;
        self.outgoing
            .send(Outgoing::Keys(keys.to_string()))
            .map_err(|_| anyhow!("nvim send task has stopped"))
    }

    /// Waits until every queued send has been delivered.
    fn flush(&mut self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.outgoing
            .send(Outgoing::Flush(done))
            .map_err(|_| anyhow!("nvim send task has stopped"))?;
        self.runtime
            .block_on(wait)
            .map_err(|_| anyhow!("nvim send task has stopped"))
    }

    /// Evaluates `expr` after all queued keys have been sent.
    fn eval(&mut self, expr: &str) -> Result<String> {
        self.check_alive()?;
        self.flush()?;
        let remote = self.remote.clone();
        self.runtime
            .block_on(async move { remote.call("--remote-expr", expr).await })
    }
}

impl Engine for NvimEngine {
    fn load(&mut self, text: &str, cursor: CursorPos) -> Result<()> {
        self.queue("<C-\\><C-n>")?;
        // Dropping undo history keeps `u` from reaching the previous puzzle.
        self.eval("execute('set undolevels=-1')")?;
        self.eval(&set_lines_expr(text)?)?;
        self.eval(&format!("execute('set undolevels={UNDO_LEVELS}')"))?;
        self.eval(&set_cursor_expr(cursor))?;
        Ok(())
    }

    /// Queues the keys and returns without waiting for delivery.
    fn send_keys(&mut self, keys: &str) -> Result<()> {
        self.queue(keys)
    }

    fn lines(&mut self) -> Result<Vec<String>> {
        let out = self.eval("json_encode(nvim_buf_get_lines(0, 0, -1, v:false))")?;
        parse_lines(&out)
    }

    fn cursor(&mut self) -> Result<CursorPos> {
        let out = self.eval("json_encode(nvim_win_get_cursor(0))")?;
        parse_cursor(&out)
    }

    fn mode(&mut self) -> Result<String> {
        self.eval("mode()")
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.eval(&format!("execute('set columns={width} lines={height}')"))
            .map(|_| ())
    }

    fn close(&mut self) -> Result<()> {
        if self.child.is_none() {
            return Ok(());
        }
        let quit = self.queue("<C-\\><C-n>:qa!<CR>");
        if let Err(e) = quit.and_then(|()| self.flush()) {
            debug!("nvim did not accept :qa!: {e:#}");
        }
        if let Some(mut child) = self.child.take() {
            let timeout = self.remote.timeout;
            let exited = self
                .runtime
                .block_on(async { tokio::time::timeout(timeout, child.wait()).await });
            if exited.is_err() {
                warn!("nvim did not exit, killing it");
                child.start_kill().context("Failed to kill nvim")?;
            }
        }
        Ok(())
    }
}

impl Drop for NvimEngine {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close nvim: {e:#}");
        }
    }
}

/// Quotes a string as a Vim single-quoted literal.
fn vim_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn set_lines_expr(text: &str) -> Result<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let json = serde_json::to_string(&lines).context("Failed to encode buffer lines")?;
    Ok(format!(
        "nvim_buf_set_lines(0, 0, -1, v:false, json_decode({}))",
        vim_quote(&json)
    ))
}

fn set_cursor_expr(cursor: CursorPos) -> String {
    format!("nvim_win_set_cursor(0, [{}, {}])", cursor.row + 1, cursor.col)
}

fn parse_lines(out: &str) -> Result<Vec<String>> {
    serde_json::from_str(out).with_context(|| format!("Unexpected buffer reply from nvim: {out}"))
}

fn parse_cursor(out: &str) -> Result<CursorPos> {
    let [row, col]: [usize; 2] = serde_json::from_str(out)
        .with_context(|| format!("Unexpected cursor reply from nvim: {out}"))?;
    // nvim rows are 1-indexed, columns 0-indexed bytes.
    Ok(CursorPos::new(row.saturating_sub(1), col))
}
