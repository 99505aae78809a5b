//! Observable process execution.
//!
//! This module provides the execution-service side of kernel launching:
//! spawning an interpreter process and exposing its output as a stream of
//! [`OutputEvent`]s that downstream consumers (protocol layers, the CLI)
//! read until the process exits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ProcessExecutionService                      │
//! │                                                              │
//! │  exec_module_observable ──► spawn `interp -m module args…`  │
//! │                                   │                          │
//! │                                   ▼                          │
//! │                     ┌──────────────────────────┐             │
//! │                     │ stdout/stderr line tasks │             │
//! │                     └────────────┬─────────────┘             │
//! │                                  ▼                           │
//! │                         ObservableOutput                     │
//! │              Stdout(..) │ Stderr(..) │ Exited(..)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`ExecutionService`] trait is the seam the daemon pool uses when no
//! daemon is available: it dispatches synchronously (the process is spawned
//! and the stream handle handed back directly, no await).

mod error;
mod observable;
mod service;

pub use error::ExecError;
pub use observable::{ExitSummary, ObservableOutput, OutputEvent};
pub use service::{
    ExecutionService, ProcessExecutionService, SpawnOptions, DEFAULT_OUTPUT_CHANNEL_CAPACITY,
};
