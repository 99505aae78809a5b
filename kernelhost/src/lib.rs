//! KernelHost - kernel process launching for interactive computing clients
//!
//! This library launches interpreter kernel processes (the runtimes behind
//! notebooks and interactive consoles) and mediates every launch through a
//! reusable daemon pool with a direct process-execution fallback.
//!
//! # High-Level API
//!
//! The [`launcher`] module is the entry point:
//!
//! ```ignore
//! use kernelhost::kernelspec::{Interpreter, KernelSpec};
//! use kernelhost::launcher::KernelLauncher;
//! use kernelhost::pool::{KernelDaemonPool, PoolConfig};
//! use std::sync::Arc;
//!
//! let pool = Arc::new(KernelDaemonPool::new(PoolConfig::default()));
//! let launcher = KernelLauncher::new(pool);
//!
//! let spec = KernelSpec::from_file(&kernel_json_path)?;
//! let interpreter = Interpreter::new("/usr/bin/python3");
//!
//! let mut result = launcher.launch(None, &spec, &interpreter).await?;
//! while let Some(event) = result.observable_output.recv().await {
//!     // stream kernel output until exit
//! }
//! ```

pub mod config;
pub mod daemon;
pub mod exec;
pub mod kernelspec;
pub mod launcher;
pub mod logging;
pub mod pool;

/// Version of the KernelHost library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
