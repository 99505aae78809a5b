//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. These
//! are pure data types; parsing and serialization live in
//! [`super::file`].

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Daemon pool settings
    pub daemon: DaemonSettings,
    /// Execution settings
    pub exec: ExecSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Daemon pool configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonSettings {
    /// Whether kernels launch through pooled daemons at all.
    /// When false, every launch uses the direct execution path.
    pub enabled: bool,

    /// Module the interpreter runs as the daemon process.
    pub module: String,

    /// Pre-warmed daemons kept per interpreter+environment key.
    pub prewarm_count: usize,

    /// Seconds allowed for a daemon's startup handshake.
    pub startup_timeout_secs: u64,
}

/// Execution configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecSettings {
    /// Capacity of each kernel's output event channel.
    pub output_channel_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory for log files.
    pub directory: PathBuf,

    /// Log file name.
    pub file_name: String,

    /// Default log level when RUST_LOG is not set.
    pub level: String,
}
