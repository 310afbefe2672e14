//! Engine session manager
//!
//! Owns at most one live UCI process. The process is launched lazily on the
//! first query, configured once, and reused for every following query. All
//! access goes through one async mutex, so queries are serialized.
//!
//! # Session states
//!
//! | State           | Meaning                                         |
//! |-----------------|-------------------------------------------------|
//! | `Uninitialized` | Nothing launched yet                            |
//! | (lock held)     | Launch + handshake in progress                  |
//! | `Ready`         | Process configured and idle                     |
//! | `Failed`        | Last launch or query failed; relaunch next call |
//! | `Closed`        | Shut down; no further launches                  |
//!
//! A failed query is never retried internally. The broken process is dropped
//! and the *next* call launches a fresh one.

use super::{uci, AnalysisEngine, EngineHealth, SearchLine};
use crate::error::{AnalysisError, AnalysisOutcome};
use crate::position::{AnalysisParameters, PositionDescriptor};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Upper bound on `uci`/`isready` round trips during startup
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Grace period for the process to exit after `quit`
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Launch and tuning parameters for the engine process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub threads: u32,
    pub hash_mb: u32,
    /// Wall-clock cap per query. `None` leaves depth as the only bound.
    pub query_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/usr/games/stockfish"),
            args: Vec::new(),
            threads: 2,
            hash_mb: 128,
            query_timeout: None,
        }
    }
}

enum SessionState {
    Uninitialized,
    Ready(UciProcess),
    Failed { reason: String },
    Closed,
}

/// Serialized handle to a single external UCI engine
pub struct EngineSession {
    config: EngineConfig,
    state: Mutex<SessionState>,
    launches: AtomicU64,
}

impl EngineSession {
    /// Create a session. Nothing is launched until first use.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SessionState::Uninitialized),
            launches: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of processes launched so far
    pub fn launch_count(&self) -> u64 {
        self.launches.load(Ordering::Relaxed)
    }

    async fn launch(&self) -> AnalysisOutcome<UciProcess> {
        self.launches.fetch_add(1, Ordering::Relaxed);
        info!(path = %self.config.path.display(), "Launching engine");
        let process = UciProcess::launch(&self.config).await?;
        info!(
            threads = self.config.threads,
            hash_mb = self.config.hash_mb,
            "Engine ready"
        );
        Ok(process)
    }

    /// Bring the state to `Ready`, launching if needed
    async fn ensure_ready<'a>(
        &self,
        state: &'a mut SessionState,
    ) -> AnalysisOutcome<&'a mut UciProcess> {
        if matches!(state, SessionState::Closed) {
            return Err(AnalysisError::engine_unavailable("engine session is closed"));
        }
        if matches!(state, SessionState::Uninitialized | SessionState::Failed { .. }) {
            match self.launch().await {
                Ok(process) => *state = SessionState::Ready(process),
                Err(e) => {
                    error!(error = %e, "Engine launch failed");
                    *state = SessionState::Failed {
                        reason: e.to_string(),
                    };
                    return Err(e);
                }
            }
        }
        match state {
            SessionState::Ready(process) => Ok(process),
            _ => Err(AnalysisError::engine_unavailable("engine session not ready")),
        }
    }
}

#[async_trait]
impl AnalysisEngine for EngineSession {
    async fn query(
        &self,
        position: &PositionDescriptor,
        params: AnalysisParameters,
    ) -> AnalysisOutcome<Vec<SearchLine>> {
        let mut state = self.state.lock().await;
        let process = self.ensure_ready(&mut state).await?;

        debug!(
            fen = %position,
            depth = params.depth(),
            breadth = params.breadth(),
            "Engine query"
        );
        let search = process.search(position.as_str(), params.depth(), params.breadth());
        let outcome = match self.config.query_timeout {
            Some(limit) => match tokio::time::timeout(limit, search).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("query exceeded {:?}", limit),
                )),
            },
            None => search.await,
        };

        match outcome {
            Ok(lines) => Ok(lines),
            Err(e) => {
                warn!(error = %e, fen = %position, "Engine query failed, discarding session");
                let broken = std::mem::replace(
                    &mut *state,
                    SessionState::Failed {
                        reason: e.to_string(),
                    },
                );
                if let SessionState::Ready(process) = broken {
                    process.kill();
                }
                Err(AnalysisError::engine_unavailable(e.to_string()))
            }
        }
    }

    async fn health(&self) -> EngineHealth {
        let Ok(mut state) = self.state.try_lock() else {
            return EngineHealth::Busy;
        };
        if matches!(*state, SessionState::Closed) {
            return EngineHealth::Unavailable;
        }
        if let SessionState::Failed { reason } = &*state {
            debug!(reason = %reason, "Engine previously failed, probing");
        }
        match self.ensure_ready(&mut state).await {
            Ok(_) => EngineHealth::Ready,
            Err(_) => EngineHealth::Unavailable,
        }
    }

    async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, SessionState::Closed);
        if let SessionState::Ready(process) = previous {
            process.quit().await;
            info!("Engine closed");
        }
    }
}

/// A launched, handshaken UCI child process
struct UciProcess {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl UciProcess {
    async fn launch(config: &EngineConfig) -> AnalysisOutcome<Self> {
        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AnalysisError::engine_unavailable(format!(
                    "failed to launch {}: {}",
                    config.path.display(),
                    e
                ))
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(AnalysisError::engine_unavailable("engine stdio not captured"));
        };
        let mut process = Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        };

        match tokio::time::timeout(HANDSHAKE_TIMEOUT, process.handshake(config)).await {
            Ok(Ok(())) => Ok(process),
            Ok(Err(e)) => Err(AnalysisError::engine_unavailable(format!(
                "handshake failed: {}",
                e
            ))),
            Err(_) => Err(AnalysisError::engine_unavailable(
                "handshake timed out waiting for uciok/readyok",
            )),
        }
    }

    async fn handshake(&mut self, config: &EngineConfig) -> io::Result<()> {
        self.send(uci::UCI).await?;
        self.wait_for(uci::UCI_OK).await?;
        self.send(&uci::set_option("Threads", config.threads)).await?;
        self.send(&uci::set_option("Hash", config.hash_mb)).await?;
        self.sync().await
    }

    async fn search(
        &mut self,
        fen: &str,
        depth: u32,
        breadth: u32,
    ) -> io::Result<Vec<SearchLine>> {
        self.send(&uci::set_option("MultiPV", breadth)).await?;
        self.send(&uci::position_fen(fen)).await?;
        self.sync().await?;
        self.send(&uci::go_depth(depth)).await?;

        // Later lines supersede earlier ones for the same rank
        let mut ranked: BTreeMap<u32, SearchLine> = BTreeMap::new();
        loop {
            let line = self.next_line().await?;
            if uci::is_bestmove(&line) {
                break;
            }
            if let Some(info) = uci::parse_info_line(&line) {
                ranked.insert(info.multipv, info);
            }
        }
        Ok(ranked.into_values().collect())
    }

    async fn send(&mut self, command: &str) -> io::Result<()> {
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    async fn next_line(&mut self) -> io::Result<String> {
        self.lines.next_line().await?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "engine closed its output")
        })
    }

    async fn wait_for(&mut self, token: &str) -> io::Result<()> {
        loop {
            if self.next_line().await?.trim() == token {
                return Ok(());
            }
        }
    }

    async fn sync(&mut self) -> io::Result<()> {
        self.send(uci::IS_READY).await?;
        self.wait_for(uci::READY_OK).await
    }

    fn kill(mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "Engine already exited");
        }
    }

    async fn quit(mut self) {
        if self.send(uci::QUIT).await.is_err() {
            self.kill();
            return;
        }
        match tokio::time::timeout(QUIT_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "Engine exited"),
            Ok(Err(e)) => warn!(error = %e, "Failed waiting for engine exit"),
            Err(_) => {
                warn!("Engine ignored quit, killing");
                self.kill();
            }
        }
    }
}
