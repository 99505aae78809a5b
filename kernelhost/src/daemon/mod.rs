//! Kernel daemons: pooled helper processes that launch kernels on request.
//!
//! A daemon is a long-lived child process of the host, one per
//! interpreter+environment key, that spawns kernel processes without paying
//! interpreter startup cost on every launch. The host controls daemons over
//! a newline-delimited JSON protocol on their stdio.
//!
//! [`KernelDaemon`] is the capability trait the launch core sees;
//! [`DaemonProcess`] is the concrete implementation the pool hands out.

mod process;
pub mod protocol;

pub use process::{
    DaemonConfig, DaemonError, DaemonProcess, KernelDaemon, DEFAULT_DAEMON_MODULE,
    DEFAULT_STARTUP_TIMEOUT_SECS,
};
