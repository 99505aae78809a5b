//! Launch errors.

use crate::daemon::DaemonError;
use crate::exec::ExecError;
use crate::pool::PoolError;
use thiserror::Error;

/// Errors from launching a kernel.
///
/// The launcher owns exactly one error kind: the unsupported-spec
/// diagnostic from argument normalization. Everything else is a
/// collaborator failure passed through verbatim so callers see the
/// original diagnostic.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The kernel spec's argv lacks the required `-m <module>` shape.
    #[error(
        "Unsupported KernelSpec file. args must be of the form \
         ['python', '-m', 'module_name', ...]; got [{argv}]"
    )]
    UnsupportedKernelSpec {
        /// The offending argv, joined for the diagnostic.
        argv: String,
    },

    /// Pool acquisition failed.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The daemon failed to start the kernel.
    #[error(transparent)]
    Daemon(#[from] DaemonError),

    /// The execution service failed to spawn the kernel.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_spec_message_prefix() {
        let error = LaunchError::UnsupportedKernelSpec {
            argv: "wow".to_string(),
        };
        let message = error.to_string();
        assert!(message.starts_with("Unsupported KernelSpec file. args must be"));
        assert!(message.contains("wow"));
    }

    #[test]
    fn test_collaborator_errors_pass_through_verbatim() {
        let daemon_error = DaemonError::Rejected {
            message: "kernel exploded".to_string(),
        };
        let original = daemon_error.to_string();

        let launch_error = LaunchError::from(PoolError::from(daemon_error));
        assert_eq!(launch_error.to_string(), original);
    }
}
