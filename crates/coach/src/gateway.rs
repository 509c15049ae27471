//! UCI engine gateway (async I/O)
//!
//! Sends directives to a long-lived engine process and forwards every line it
//! prints, tagged with the request that was in flight when the line arrived.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::EngineSettings;
use crate::error::CoachError;

/// Why the controller asked for an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPurpose {
    /// Position before the coached move, to learn what should have been played
    PreMoveAdvice,
    /// Position after a move, to score what was actually played
    PostMoveAdvice,
    /// Position reached by stepping back
    Rewind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestTag {
    pub seq: u64,
    pub purpose: RequestPurpose,
}

/// One raw engine output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLine {
    /// Oldest request still in flight, `None` outside any search
    pub tag: Option<RequestTag>,
    pub text: String,
}

type InFlight = Arc<Mutex<VecDeque<RequestTag>>>;

pub struct EngineGateway<W = ChildStdin> {
    writer: Option<W>,
    process: Option<Child>,
    in_flight: InFlight,
    reader_task: Option<JoinHandle<()>>,
    depth: u32,
    ready: bool,
}

impl EngineGateway<ChildStdin> {
    /// Spawn the engine process. A failed spawn is logged and yields a
    /// gateway that is never ready.
    pub async fn spawn(settings: &EngineSettings, lines: mpsc::UnboundedSender<EngineLine>) -> Self {
        let spawned = Command::new(&settings.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut process = match spawned {
            Ok(process) => process,
            Err(e) => {
                error!(engine = %settings.path, error = %e, "Failed to spawn engine, evaluation disabled");
                return Self::unavailable(settings.depth);
            }
        };

        let (Some(stdin), Some(stdout)) = (process.stdin.take(), process.stdout.take()) else {
            error!(engine = %settings.path, "Engine stdio not captured, evaluation disabled");
            let _ = process.start_kill();
            return Self::unavailable(settings.depth);
        };

        let mut gateway = Self::attach(stdin, stdout, settings, lines).await;
        gateway.process = Some(process);
        if gateway.ready {
            info!(engine = %settings.path, depth = settings.depth, "Engine loaded");
        }
        gateway
    }
}

impl<W> EngineGateway<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wire the gateway to an already-open engine stream and send the handshake.
    pub async fn attach<R>(
        writer: W,
        reader: R,
        settings: &EngineSettings,
        lines: mpsc::UnboundedSender<EngineLine>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let in_flight: InFlight = Arc::new(Mutex::new(VecDeque::new()));
        let reader_task = tokio::spawn(forward_lines(BufReader::new(reader), in_flight.clone(), lines));

        let mut gateway = Self {
            writer: Some(writer),
            process: None,
            in_flight,
            reader_task: Some(reader_task),
            depth: settings.depth,
            ready: false,
        };

        match gateway.handshake(settings).await {
            Ok(()) => gateway.ready = true,
            Err(e) => {
                error!(error = %e, "Engine handshake failed, evaluation disabled");
                gateway.writer = None;
            }
        }
        gateway
    }

    /// A gateway with no engine behind it; every `evaluate` is a no-op.
    pub fn unavailable(depth: u32) -> Self {
        Self {
            writer: None,
            process: None,
            in_flight: Arc::new(Mutex::new(VecDeque::new())),
            reader_task: None,
            depth,
            ready: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    // Fire-and-forget: ready as soon as these are written, `uciok` is not awaited
    async fn handshake(&mut self, settings: &EngineSettings) -> Result<(), CoachError> {
        self.send("uci").await?;
        self.send(&format!("setoption name Threads value {}", settings.threads)).await?;
        self.send(&format!("setoption name Hash value {}", settings.hash_mb)).await?;
        Ok(())
    }

    /// Ask for a fixed-depth search of `fen`. Returns whether the request was
    /// sent; when the engine is not ready nothing is written.
    pub async fn evaluate(&mut self, fen: &str, tag: RequestTag) -> bool {
        if !self.ready {
            debug!(seq = tag.seq, "Engine not ready, skipping evaluation");
            return false;
        }

        self.in_flight.lock().await.push_back(tag);

        let depth = self.depth;
        let sent = match self.send(&format!("position fen {fen}")).await {
            Ok(()) => self.send(&format!("go depth {depth}")).await,
            Err(e) => Err(e),
        };

        match sent {
            Ok(()) => true,
            Err(e) => {
                error!(seq = tag.seq, error = %e, "Engine write failed, evaluation disabled");
                self.in_flight.lock().await.retain(|t| *t != tag);
                self.ready = false;
                self.writer = None;
                false
            }
        }
    }

    /// Send a command to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), CoachError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CoachError::Engine("engine is not attached".into()))?;
        debug!(cmd, "Engine <");
        writer
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| CoachError::Engine(format!("Failed to write to engine: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| CoachError::Engine(format!("Failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        if self.writer.is_some() {
            let _ = self.send("quit").await;
        }
        self.ready = false;
        self.writer = None;
        if let Some(process) = self.process.as_mut() {
            let _ = process.wait().await;
        }
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}

impl<W> Drop for EngineGateway<W> {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        if let Some(process) = self.process.as_mut() {
            let _ = process.start_kill();
        }
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}

/// Forward every engine line to the channel, tagging it with the oldest
/// in-flight request. A `bestmove` line retires that request.
async fn forward_lines<R>(reader: BufReader<R>, in_flight: InFlight, tx: mpsc::UnboundedSender<EngineLine>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(text)) => {
                debug!(line = text.trim(), "Engine >");
                let tag = {
                    let mut queue = in_flight.lock().await;
                    let tag = queue.front().copied();
                    if text.trim_start().starts_with("bestmove") {
                        queue.pop_front();
                    }
                    tag
                };
                if tx.send(EngineLine { tag, text }).is_err() {
                    debug!("Line receiver dropped, stopping engine reader");
                    break;
                }
            }
            Ok(None) => {
                warn!("Engine closed its output");
                break;
            }
            Err(e) => {
                error!(error = %e, "Failed to read from engine");
                break;
            }
        }
    }
}
