//! The kernel launcher.

use super::args::LaunchArgs;
use super::error::LaunchError;
use crate::daemon::KernelDaemon;
use crate::exec::{ObservableOutput, SpawnOptions};
use crate::kernelspec::{Interpreter, KernelSpec};
use crate::pool::{DaemonPool, PoolHandle};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// What a successful launch produced.
///
/// Ownership passes entirely to the caller: the observable output is read
/// until kernel exit, and the daemon handle (when present) is retained for
/// the kernel's lifetime.
pub struct LaunchResult {
    /// The kernel's live output/exit stream.
    pub observable_output: ObservableOutput,

    /// The daemon running the kernel, when one was used.
    ///
    /// `None` means the kernel was spawned through the plain execution
    /// service: no daemon-specific lifecycle control (interrupt/kill) is
    /// available and the generic execution-service path must be used
    /// instead.
    pub daemon: Option<Arc<dyn KernelDaemon>>,
}

impl std::fmt::Debug for LaunchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchResult")
            .field("observable_output", &self.observable_output)
            .field("daemon", &self.daemon.is_some())
            .finish()
    }
}

/// Mediates kernel launches through a daemon pool.
///
/// Stateless beyond the injected pool reference: concurrent `launch`
/// calls are independent, and any serialization (one daemon per key,
/// spawn limits) is entirely the pool's concern.
pub struct KernelLauncher<P: DaemonPool> {
    pool: Arc<P>,
}

impl<P: DaemonPool> KernelLauncher<P> {
    /// Creates a launcher over the given pool.
    pub fn new(pool: Arc<P>) -> Self {
        Self { pool }
    }

    /// Launches the kernel described by `spec` with `interpreter`.
    ///
    /// Normalizes the spec's argv, acquires a handle from the pool, and
    /// dispatches the start call on whichever variant came back. Either a
    /// fully-formed [`LaunchResult`] is returned or the call fails
    /// entirely; there is no partial-result state and no retry.
    pub async fn launch(
        &self,
        resource: Option<&Path>,
        spec: &KernelSpec,
        interpreter: &Interpreter,
    ) -> Result<LaunchResult, LaunchError> {
        let args = LaunchArgs::from_argv(&spec.argv)?;
        debug!(
            kernel = %spec.display_name,
            module = %args.module,
            residual = ?args.residual,
            interpreter = %interpreter.path.display(),
            "Launching kernel"
        );

        let handle = self.pool.get(resource, spec, interpreter).await?;
        let options = SpawnOptions::with_env(spec.env.clone());

        match handle {
            PoolHandle::Daemon(daemon) => {
                let observable_output = daemon.start(&args.module, &args.residual, &options).await?;
                info!(kernel = %spec.display_name, "Kernel launched via daemon");
                Ok(LaunchResult {
                    observable_output,
                    daemon: Some(daemon),
                })
            }
            PoolHandle::Executor(service) => {
                let observable_output =
                    service.exec_module_observable(&args.module, &args.residual, &options)?;
                info!(kernel = %spec.display_name, "Kernel launched via execution service");
                Ok(LaunchResult {
                    observable_output,
                    daemon: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolError;
    use std::future::Future;
    use std::pin::Pin;

    /// Pool double that fails every acquisition.
    struct FailingPool;

    impl DaemonPool for FailingPool {
        fn get<'a>(
            &'a self,
            _resource: Option<&'a Path>,
            _spec: &'a KernelSpec,
            _interpreter: &'a Interpreter,
        ) -> Pin<Box<dyn Future<Output = Result<PoolHandle, PoolError>> + Send + 'a>> {
            Box::pin(async {
                Err(PoolError::Daemon(crate::daemon::DaemonError::Closed))
            })
        }
    }

    #[tokio::test]
    async fn test_bad_argv_fails_before_pool_acquisition() {
        // The failing pool would surface a pool error; a bad argv must
        // fail with the normalizer's diagnostic instead.
        let launcher = KernelLauncher::new(Arc::new(FailingPool));
        let spec = KernelSpec::new(vec!["wow".to_string()], "Broken", "python");
        let interpreter = Interpreter::new("/usr/bin/python3");

        let error = launcher.launch(None, &spec, &interpreter).await.unwrap_err();
        assert!(matches!(error, LaunchError::UnsupportedKernelSpec { .. }));
    }

    #[tokio::test]
    async fn test_pool_error_propagates_unchanged() {
        let launcher = KernelLauncher::new(Arc::new(FailingPool));
        let spec = KernelSpec::new(
            vec!["python".to_string(), "-m".to_string(), "mykernel".to_string()],
            "Python 3",
            "python",
        );
        let interpreter = Interpreter::new("/usr/bin/python3");

        let error = launcher.launch(None, &spec, &interpreter).await.unwrap_err();
        assert!(matches!(error, LaunchError::Pool(_)));
    }
}
