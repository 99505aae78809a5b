//! Launch mediation: the core of kernel launching.
//!
//! Given a kernel spec and an interpreter, the launcher normalizes the
//! spec's invocation template, acquires a handle from the daemon pool,
//! dispatches the start call on whichever variant came back, and returns
//! a uniform [`LaunchResult`] describing what is running and how to
//! observe it.
//!
//! ```text
//! caller ──► KernelLauncher::launch
//!               │ 1. LaunchArgs::from_argv   (fail fast on bad argv)
//!               │ 2. pool.get                (may suspend)
//!               │ 3. match PoolHandle
//!               │      Daemon(d)   ──► d.start(...)             (await)
//!               │      Executor(e) ──► e.exec_module_observable (direct)
//!               ▼
//!            LaunchResult { observable_output, daemon }
//! ```
//!
//! The launcher is a thin, fail-fast orchestrator: it owns exactly one
//! error kind ([`LaunchError::UnsupportedKernelSpec`]) and passes every
//! collaborator failure through verbatim.

mod args;
mod core;
mod error;

pub use args::LaunchArgs;
pub use error::LaunchError;
pub use self::core::{KernelLauncher, LaunchResult};
