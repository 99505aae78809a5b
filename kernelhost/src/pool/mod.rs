//! Daemon pool: pre-warmed kernel daemons with a direct-execution fallback.
//!
//! The pool is the single acquisition point for launch mediation. Callers
//! ask for a handle with [`DaemonPool::get`] and receive one of two
//! variants, expressed as a tagged union so the "neither capability"
//! state is unrepresentable:
//!
//! - [`PoolHandle::Daemon`]: a pooled [`KernelDaemon`](crate::daemon::KernelDaemon)
//!   with `start` plus interrupt/kill lifecycle control,
//! - [`PoolHandle::Executor`]: a plain
//!   [`ExecutionService`](crate::exec::ExecutionService) that spawns the
//!   kernel directly, without daemon lifecycle control.
//!
//! The pool is always an injected dependency (constructor/parameter
//! passed), never a global, so it stays substitutable in tests and safe
//! under concurrent launches.
//!
//! Sizing policy is deliberately minimal: a fixed pre-warm target per
//! interpreter+environment key, background top-up after a daemon is
//! handed out, and no idle eviction.

mod core;
mod handle;

pub use handle::{DaemonPool, PoolError, PoolHandle};
pub use self::core::{KernelDaemonPool, PoolConfig, DEFAULT_PREWARM_COUNT};
