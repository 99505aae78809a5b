//! Observable output stream for launched processes.
//!
//! The [`ObservableOutput`] is returned when a kernel process is started.
//! It is the single handle a consumer holds on a running kernel's output:
//! stdout and stderr lines arrive in order per stream, and an
//! [`OutputEvent::Exited`] event terminates the stream.
//!
//! # Example
//!
//! ```ignore
//! use kernelhost::exec::OutputEvent;
//!
//! while let Some(event) = observable.recv().await {
//!     match event {
//!         OutputEvent::Stdout(line) => println!("{line}"),
//!         OutputEvent::Stderr(line) => eprintln!("{line}"),
//!         OutputEvent::Exited(exit) => break,
//!     }
//! }
//! ```

use std::process::ExitStatus;
use tokio::sync::mpsc;

/// One event on a running process's output stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    /// A line written to the process's stdout.
    Stdout(String),

    /// A line written to the process's stderr.
    Stderr(String),

    /// The process exited. This is always the last event on the stream.
    Exited(ExitSummary),
}

/// How a process terminated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExitSummary {
    /// Exit code, when the process exited normally.
    pub code: Option<i32>,

    /// Terminating signal number, when the process was killed (Unix only).
    pub signal: Option<i32>,
}

impl ExitSummary {
    /// Builds a summary from a wait status.
    pub fn from_status(status: &ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: signal_of(status),
        }
    }

    /// Summary for a process whose exit status could not be collected.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Returns true if the process exited with code zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}

impl std::fmt::Display for ExitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}

/// Live handle to a running process's output and exit-status stream.
///
/// Producers (the execution service or a kernel daemon) hold the sender
/// side and feed events in; the consumer reads with [`recv`](Self::recv)
/// until the stream closes. Ownership of the handle passes entirely to the
/// caller of `launch` - there is no further lifecycle management here.
pub struct ObservableOutput {
    events: mpsc::Receiver<OutputEvent>,
    pid: Option<u32>,
}

impl ObservableOutput {
    /// Creates an observable output and the sender side that feeds it.
    ///
    /// `pid` is the OS process id when the process was spawned directly,
    /// or `None` when the process is managed on the far side of a daemon.
    pub fn channel(capacity: usize, pid: Option<u32>) -> (Self, mpsc::Sender<OutputEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { events: rx, pid }, tx)
    }

    /// Receives the next output event.
    ///
    /// Returns `None` once the stream is closed. [`OutputEvent::Exited`]
    /// is the last event a well-behaved producer sends.
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        self.events.recv().await
    }

    /// Returns the OS process id, when known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

impl std::fmt::Debug for ObservableOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableOutput")
            .field("pid", &self.pid)
            .finish()
    }
}
