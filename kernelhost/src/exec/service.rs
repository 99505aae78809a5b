//! Process execution service.
//!
//! [`ProcessExecutionService`] is the daemon-less execution path: it spawns
//! an interpreter process directly and wires its stdout, stderr, and exit
//! status into an [`ObservableOutput`]. The daemon pool hands this service
//! out (wrapped in the executor variant of its handle) whenever a pooled
//! daemon is unavailable, so kernels still launch - just without
//! daemon-specific lifecycle control.

use super::error::ExecError;
use super::observable::{ExitSummary, ObservableOutput, OutputEvent};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// Default capacity of the output event channel.
pub const DEFAULT_OUTPUT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Spawn Options
// =============================================================================

/// Options applied to a spawned process.
#[derive(Clone, Debug, Default)]
pub struct SpawnOptions {
    /// Environment overrides, merged over the parent environment.
    ///
    /// This is the kernel spec's `env` field forwarded verbatim; no other
    /// environment merging happens at this layer.
    pub env: HashMap<String, String>,
}

impl SpawnOptions {
    /// Options carrying an environment mapping.
    pub fn with_env(env: HashMap<String, String>) -> Self {
        Self { env }
    }
}

// =============================================================================
// Execution Service Trait
// =============================================================================

/// Process-execution capability without pooling or reuse semantics.
///
/// Dispatch is synchronous: the process is spawned and the stream handle
/// returned directly, with no separate await. Implementations must be
/// called from within a Tokio runtime, since they spawn the tasks that
/// forward child output into the stream.
pub trait ExecutionService: Send + Sync + 'static {
    /// Spawns `interpreter -m module args...` and returns its output stream.
    fn exec_module_observable(
        &self,
        module: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<ObservableOutput, ExecError>;

    /// Spawns `interpreter args...` directly and returns its output stream.
    fn exec_observable(
        &self,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<ObservableOutput, ExecError>;
}

// =============================================================================
// Process Execution Service
// =============================================================================

/// Tokio-backed [`ExecutionService`] bound to one interpreter executable.
#[derive(Clone, Debug)]
pub struct ProcessExecutionService {
    interpreter_path: PathBuf,
    channel_capacity: usize,
}

impl ProcessExecutionService {
    /// Creates a service that invokes the given interpreter executable.
    pub fn new(interpreter_path: PathBuf) -> Self {
        Self {
            interpreter_path,
            channel_capacity: DEFAULT_OUTPUT_CHANNEL_CAPACITY,
        }
    }

    /// Overrides the output event channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Returns the interpreter executable this service invokes.
    pub fn interpreter_path(&self) -> &PathBuf {
        &self.interpreter_path
    }

    fn spawn_observed(&self, mut command: Command) -> Result<ObservableOutput, ExecError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: self.interpreter_path.clone(),
            source,
        })?;
        let pid = child.id();
        debug!(program = %self.interpreter_path.display(), pid, "Spawned process");

        let stdout = child.stdout.take().ok_or(ExecError::MissingStdio("stdout"))?;
        let stderr = child.stderr.take().ok_or(ExecError::MissingStdio("stderr"))?;

        let (observable, events) = ObservableOutput::channel(self.channel_capacity, pid);

        let out_task = forward_lines(stdout, events.clone(), OutputEvent::Stdout);
        let err_task = forward_lines(stderr, events.clone(), OutputEvent::Stderr);

        tokio::spawn(async move {
            let status = child.wait().await;
            // Drain both streams before signalling exit so Exited is last.
            let _ = out_task.await;
            let _ = err_task.await;
            let summary = match status {
                Ok(status) => ExitSummary::from_status(&status),
                Err(_) => ExitSummary::unknown(),
            };
            debug!(pid, exit = %summary, "Process exited");
            let _ = events.send(OutputEvent::Exited(summary)).await;
        });

        Ok(observable)
    }

    fn command(&self, options: &SpawnOptions) -> Command {
        let mut command = Command::new(&self.interpreter_path);
        command.envs(&options.env);
        command
    }
}

impl ExecutionService for ProcessExecutionService {
    fn exec_module_observable(
        &self,
        module: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<ObservableOutput, ExecError> {
        let mut command = self.command(options);
        command.arg("-m").arg(module).args(args);
        debug!(
            interpreter = %self.interpreter_path.display(),
            module,
            args = ?args,
            "Executing module"
        );
        self.spawn_observed(command)
    }

    fn exec_observable(
        &self,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<ObservableOutput, ExecError> {
        let mut command = self.command(options);
        command.args(args);
        debug!(
            interpreter = %self.interpreter_path.display(),
            args = ?args,
            "Executing"
        );
        self.spawn_observed(command)
    }
}

/// Forwards lines from a child stream into the event channel.
fn forward_lines<R>(
    reader: R,
    events: mpsc::Sender<OutputEvent>,
    wrap: fn(String) -> OutputEvent,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if events.send(wrap(line)).await.is_err() {
                // Consumer dropped the observable; stop forwarding.
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[cfg(unix)]
    fn sh() -> ProcessExecutionService {
        ProcessExecutionService::new(PathBuf::from("/bin/sh"))
    }

    #[cfg(unix)]
    async fn collect(mut observable: ObservableOutput) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_secs(5), observable.recv()).await
        {
            events.push(event);
        }
        events
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exec_observable_streams_stdout_then_exit() {
        let service = sh();
        let observable = service
            .exec_observable(
                &["-c".into(), "echo alpha; echo beta".into()],
                &SpawnOptions::default(),
            )
            .unwrap();

        let events = collect(observable).await;
        assert_eq!(
            events,
            vec![
                OutputEvent::Stdout("alpha".into()),
                OutputEvent::Stdout("beta".into()),
                OutputEvent::Exited(ExitSummary {
                    code: Some(0),
                    signal: None
                }),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exec_observable_separates_stderr() {
        let service = sh();
        let observable = service
            .exec_observable(
                &["-c".into(), "echo out; echo err 1>&2".into()],
                &SpawnOptions::default(),
            )
            .unwrap();

        let events = collect(observable).await;
        assert!(events.contains(&OutputEvent::Stdout("out".into())));
        assert!(events.contains(&OutputEvent::Stderr("err".into())));
        assert!(matches!(events.last(), Some(OutputEvent::Exited(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exec_observable_env_visible_to_child() {
        let service = sh();
        let mut env = HashMap::new();
        env.insert("KERNELHOST_TEST_VALUE".to_string(), "present".to_string());

        let observable = service
            .exec_observable(
                &["-c".into(), "echo $KERNELHOST_TEST_VALUE".into()],
                &SpawnOptions::with_env(env),
            )
            .unwrap();

        let events = collect(observable).await;
        assert_eq!(events[0], OutputEvent::Stdout("present".into()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exec_observable_nonzero_exit_code() {
        let service = sh();
        let observable = service
            .exec_observable(&["-c".into(), "exit 7".into()], &SpawnOptions::default())
            .unwrap();

        let events = collect(observable).await;
        assert_eq!(
            events.last(),
            Some(&OutputEvent::Exited(ExitSummary {
                code: Some(7),
                signal: None
            }))
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_for_missing_program() {
        let service = ProcessExecutionService::new(PathBuf::from(
            "/nonexistent/kernelhost-no-such-interpreter",
        ));
        let result = service.exec_observable(&["-c".into(), "true".into()], &SpawnOptions::default());
        assert!(matches!(result, Err(ExecError::Spawn { .. })));
    }
}
