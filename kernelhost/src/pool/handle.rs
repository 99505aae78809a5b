//! Pool handle variants and the acquisition trait.

use crate::daemon::{DaemonError, KernelDaemon};
use crate::exec::ExecutionService;
use crate::kernelspec::{Interpreter, KernelSpec};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors from pool acquisition.
///
/// Opaque to the launch core; launch propagates these unchanged.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A daemon could not be provided.
    #[error(transparent)]
    Daemon(#[from] DaemonError),
}

/// The handle a pool acquisition produces.
///
/// A tagged union over the two launch paths. Which variant comes back is
/// entirely the pool's decision (availability, resource pressure,
/// configuration); callers dispatch by matching, never by capability
/// probing.
#[derive(Clone)]
pub enum PoolHandle {
    /// A pooled daemon: `start` plus daemon-specific lifecycle control.
    Daemon(Arc<dyn KernelDaemon>),

    /// A plain execution service: spawn-per-call, no lifecycle control.
    Executor(Arc<dyn ExecutionService>),
}

impl std::fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daemon(_) => f.write_str("PoolHandle::Daemon"),
            Self::Executor(_) => f.write_str("PoolHandle::Executor"),
        }
    }
}

/// Acquisition capability of a daemon pool.
///
/// `get` may suspend while a daemon is located or spawned; no timeout is
/// imposed by callers - retry and timeout policy belongs to the pool.
pub trait DaemonPool: Send + Sync + 'static {
    /// Acquires a handle for launching a kernel.
    ///
    /// `resource` is an opaque caller context (e.g. a workspace
    /// directory); the spec and interpreter identify what will be
    /// launched and with which runtime. Ownership of the returned handle
    /// transfers to the caller for the kernel's lifetime.
    fn get<'a>(
        &'a self,
        resource: Option<&'a Path>,
        spec: &'a KernelSpec,
        interpreter: &'a Interpreter,
    ) -> Pin<Box<dyn Future<Output = Result<PoolHandle, PoolError>> + Send + 'a>>;
}
