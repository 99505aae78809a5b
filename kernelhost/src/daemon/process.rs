//! Kernel daemon process management.
//!
//! A [`DaemonProcess`] is a long-lived helper process (`interpreter -m
//! <daemon module>`) that spawns and manages kernel child processes on
//! request. The host controls it over the newline-delimited JSON protocol
//! in [`super::protocol`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       DaemonProcess                          │
//! │                                                              │
//! │  start/interrupt/kill ──► stdin ──► daemon child process     │
//! │                                          │                   │
//! │                     stdout (JSON lines)  │                   │
//! │                                          ▼                   │
//! │                 ┌─────────────────────────────────┐          │
//! │                 │           read loop             │          │
//! │                 │  Reply{id}  ──► pending waiter  │          │
//! │                 │  Output     ──► kernel stream   │          │
//! │                 │  KernelExited ─► close stream   │          │
//! │                 └─────────────────────────────────┘          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! One kernel per daemon at a time: the pool hands each daemon to exactly
//! one launch, and a second `start` on a busy daemon is rejected rather
//! than silently retargeting the event stream.

use crate::daemon::protocol::{DaemonMessage, DaemonOp, DaemonRequest, StreamKind};
use crate::exec::{ExecError, ExitSummary, ObservableOutput, OutputEvent, SpawnOptions};
use crate::kernelspec::Interpreter;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// =============================================================================
// Configuration
// =============================================================================

/// Default module executed as the daemon (`interpreter -m <module>`).
pub const DEFAULT_DAEMON_MODULE: &str = "kernelhost_daemon";

/// Default time allowed for the daemon's startup handshake.
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 30;

/// Configuration for spawning daemon processes.
#[derive(Clone, Debug)]
pub struct DaemonConfig {
    /// Module the interpreter runs as the daemon.
    pub module: String,

    /// Time allowed for the startup handshake before giving up.
    pub startup_timeout: Duration,

    /// Capacity of the kernel output event channel.
    pub output_channel_capacity: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            module: DEFAULT_DAEMON_MODULE.to_string(),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            output_channel_capacity: crate::exec::DEFAULT_OUTPUT_CHANNEL_CAPACITY,
        }
    }
}

impl From<&crate::config::DaemonSettings> for DaemonConfig {
    fn from(settings: &crate::config::DaemonSettings) -> Self {
        Self {
            module: settings.module.clone(),
            startup_timeout: Duration::from_secs(settings.startup_timeout_secs),
            output_channel_capacity: crate::exec::DEFAULT_OUTPUT_CHANNEL_CAPACITY,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors from daemon spawning and control.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The daemon process could not be spawned.
    #[error(transparent)]
    Spawn(#[from] ExecError),

    /// The daemon did not complete its startup handshake.
    #[error("Kernel daemon failed its startup handshake: {message}")]
    Handshake {
        /// What went wrong during the handshake.
        message: String,
    },

    /// A protocol message could not be encoded.
    #[error("Kernel daemon protocol error: {message}")]
    Protocol {
        /// Encoding diagnostic.
        message: String,
    },

    /// The daemon rejected an operation.
    #[error("Kernel daemon rejected the request: {message}")]
    Rejected {
        /// The daemon's diagnostic.
        message: String,
    },

    /// The daemon's control channel closed before the operation completed.
    #[error("Kernel daemon closed its control channel")]
    Closed,
}

// =============================================================================
// Kernel Daemon Trait
// =============================================================================

/// Capability set of the daemon variant of a pool handle.
///
/// `start` launches a kernel inside the daemon and hands back its output
/// stream; `interrupt` and `kill` are the daemon-specific lifecycle
/// controls that the plain execution path does not offer.
pub trait KernelDaemon: Send + Sync + 'static {
    /// Starts `module args...` as a kernel and returns its output stream.
    ///
    /// Suspends until the daemon acknowledges the start.
    fn start<'a>(
        &'a self,
        module: &'a str,
        args: &'a [String],
        options: &'a SpawnOptions,
    ) -> Pin<Box<dyn Future<Output = Result<ObservableOutput, DaemonError>> + Send + 'a>>;

    /// Interrupts the running kernel.
    fn interrupt<'a>(&'a self)
        -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + 'a>>;

    /// Kills the running kernel.
    fn kill<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + 'a>>;
}

// =============================================================================
// Daemon Process
// =============================================================================

type PendingReplies = DashMap<u64, oneshot::Sender<Result<(), DaemonError>>>;
type KernelEventSink = Mutex<Option<mpsc::Sender<OutputEvent>>>;

/// A running kernel daemon child process.
///
/// Owns the daemon's stdin; a background read loop routes replies to
/// per-request waiters by id and kernel output events into the observable
/// stream of the started kernel.
pub struct DaemonProcess {
    stdin: Mutex<ChildStdin>,
    next_id: AtomicU64,
    pending: Arc<PendingReplies>,
    kernel_events: Arc<KernelEventSink>,
    kernel_active: Arc<AtomicBool>,
    shutdown: CancellationToken,
    pid: Option<u32>,
    output_capacity: usize,
}

impl DaemonProcess {
    /// Spawns a daemon for the given interpreter and completes the startup
    /// handshake.
    ///
    /// The daemon is killed again if the handshake fails or times out.
    pub async fn spawn(
        interpreter: &Interpreter,
        config: &DaemonConfig,
    ) -> Result<Arc<Self>, DaemonError> {
        let mut command = Command::new(&interpreter.path);
        command
            .arg("-m")
            .arg(&config.module)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| {
            DaemonError::Spawn(ExecError::Spawn {
                program: interpreter.path.clone(),
                source,
            })
        })?;
        let pid = child.id();

        let stdin = child
            .stdin
            .take()
            .ok_or(DaemonError::Spawn(ExecError::MissingStdio("stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(DaemonError::Spawn(ExecError::MissingStdio("stdout")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(DaemonError::Spawn(ExecError::MissingStdio("stderr")))?;

        info!(
            interpreter = %interpreter.path.display(),
            module = %config.module,
            pid,
            "Spawned kernel daemon"
        );

        let daemon = Arc::new(Self {
            stdin: Mutex::new(stdin),
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
            kernel_events: Arc::new(Mutex::new(None)),
            kernel_active: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
            pid,
            output_capacity: config.output_channel_capacity,
        });

        // Daemon stderr is diagnostics, not kernel output; surface it in logs.
        tokio::spawn({
            let shutdown = daemon.shutdown.clone();
            async move {
                let mut lines = BufReader::new(stderr).lines();
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        line = lines.next_line() => match line {
                            Ok(Some(line)) => warn!(pid, line = %line, "Kernel daemon stderr"),
                            _ => break,
                        },
                    }
                }
            }
        });

        tokio::spawn(read_loop(
            stdout,
            Arc::clone(&daemon.pending),
            Arc::clone(&daemon.kernel_events),
            Arc::clone(&daemon.kernel_active),
            daemon.shutdown.clone(),
            pid,
        ));

        // Reap the child; kill it when the host shuts the daemon down.
        tokio::spawn({
            let shutdown = daemon.shutdown.clone();
            let pending = Arc::clone(&daemon.pending);
            async move {
                tokio::select! {
                    status = child.wait() => {
                        // Cleanup happens in the read loop once it drains
                        // the remaining buffered output and hits EOF.
                        debug!(pid, status = ?status.ok(), "Kernel daemon exited");
                    }
                    _ = shutdown.cancelled() => {
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        debug!(pid, "Kernel daemon killed on shutdown");
                        fail_pending(&pending);
                    }
                }
            }
        });

        match tokio::time::timeout(config.startup_timeout, daemon.request(DaemonOp::Ping)).await {
            Ok(Ok(())) => {
                debug!(pid, "Kernel daemon ready");
                Ok(daemon)
            }
            Ok(Err(error)) => {
                daemon.shutdown();
                Err(DaemonError::Handshake {
                    message: error.to_string(),
                })
            }
            Err(_) => {
                daemon.shutdown();
                Err(DaemonError::Handshake {
                    message: format!(
                        "no response within {}s",
                        config.startup_timeout.as_secs()
                    ),
                })
            }
        }
    }

    /// Returns the daemon's OS process id, when known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Tears the daemon down: the child is killed and background tasks stop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Sends one request and waits for its reply.
    async fn request(&self, op: DaemonOp) -> Result<(), DaemonError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let line = DaemonRequest { id, op }
            .encode()
            .map_err(|error| DaemonError::Protocol {
                message: error.to_string(),
            })?;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        {
            let mut stdin = self.stdin.lock().await;
            let write = async {
                stdin.write_all(line.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await
            };
            if write.await.is_err() {
                self.pending.remove(&id);
                return Err(DaemonError::Closed);
            }
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(DaemonError::Closed),
        }
    }
}

impl KernelDaemon for DaemonProcess {
    fn start<'a>(
        &'a self,
        module: &'a str,
        args: &'a [String],
        options: &'a SpawnOptions,
    ) -> Pin<Box<dyn Future<Output = Result<ObservableOutput, DaemonError>> + Send + 'a>> {
        Box::pin(async move {
            if self.kernel_active.swap(true, Ordering::SeqCst) {
                return Err(DaemonError::Rejected {
                    message: "daemon is already running a kernel".to_string(),
                });
            }

            let (observable, events) = ObservableOutput::channel(self.output_capacity, None);
            *self.kernel_events.lock().await = Some(events);

            debug!(pid = self.pid, module, args = ?args, "Starting kernel via daemon");
            let op = DaemonOp::StartKernel {
                module: module.to_string(),
                args: args.to_vec(),
                env: options.env.clone(),
            };

            match self.request(op).await {
                Ok(()) => Ok(observable),
                Err(error) => {
                    self.kernel_events.lock().await.take();
                    self.kernel_active.store(false, Ordering::SeqCst);
                    Err(error)
                }
            }
        })
    }

    fn interrupt<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + 'a>> {
        Box::pin(async move {
            debug!(pid = self.pid, "Interrupting kernel");
            self.request(DaemonOp::InterruptKernel).await
        })
    }

    fn kill<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + 'a>> {
        Box::pin(async move {
            debug!(pid = self.pid, "Killing kernel");
            self.request(DaemonOp::KillKernel).await
        })
    }
}

impl std::fmt::Debug for DaemonProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonProcess")
            .field("pid", &self.pid)
            .field("kernel_active", &self.kernel_active.load(Ordering::SeqCst))
            .finish()
    }
}

// =============================================================================
// Read loop
// =============================================================================

/// Routes daemon stdout messages to waiters and the kernel stream.
async fn read_loop(
    stdout: ChildStdout,
    pending: Arc<PendingReplies>,
    kernel_events: Arc<KernelEventSink>,
    kernel_active: Arc<AtomicBool>,
    shutdown: CancellationToken,
    pid: Option<u32>,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    _ => {
                        debug!(pid, "Daemon control channel closed");
                        fail_pending(&pending);
                        close_kernel_stream(&kernel_events, &kernel_active, ExitSummary::unknown())
                            .await;
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match DaemonMessage::decode(&line) {
                    Ok(DaemonMessage::Reply { id, error }) => {
                        if let Some((_, tx)) = pending.remove(&id) {
                            let result = match error {
                                None => Ok(()),
                                Some(message) => Err(DaemonError::Rejected { message }),
                            };
                            let _ = tx.send(result);
                        } else {
                            warn!(pid, id, "Daemon reply for unknown request");
                        }
                    }
                    Ok(DaemonMessage::Output { stream, data }) => {
                        let sender = kernel_events.lock().await.clone();
                        if let Some(tx) = sender {
                            let event = match stream {
                                StreamKind::Stdout => OutputEvent::Stdout(data),
                                StreamKind::Stderr => OutputEvent::Stderr(data),
                            };
                            if tx.send(event).await.is_err() {
                                // Consumer dropped the observable.
                                kernel_events.lock().await.take();
                            }
                        }
                    }
                    Ok(DaemonMessage::KernelExited { code, signal }) => {
                        debug!(pid, code, signal, "Kernel exited");
                        close_kernel_stream(
                            &kernel_events,
                            &kernel_active,
                            ExitSummary { code, signal },
                        )
                        .await;
                    }
                    Err(error) => {
                        warn!(pid, %error, line = %line, "Unparseable daemon message");
                    }
                }
            }
        }
    }
}

/// Fails every outstanding request with [`DaemonError::Closed`].
fn fail_pending(pending: &PendingReplies) {
    let ids: Vec<u64> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(DaemonError::Closed));
        }
    }
}

/// Terminates the kernel's observable stream and marks the daemon idle.
async fn close_kernel_stream(
    kernel_events: &KernelEventSink,
    kernel_active: &AtomicBool,
    exit: ExitSummary,
) {
    let sender = kernel_events.lock().await.take();
    kernel_active.store(false, Ordering::SeqCst);
    if let Some(tx) = sender {
        let _ = tx.send(OutputEvent::Exited(exit)).await;
    }
}
