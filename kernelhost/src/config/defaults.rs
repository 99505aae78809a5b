//! Default values for all configuration settings.

use super::settings::*;
use crate::daemon::{DEFAULT_DAEMON_MODULE, DEFAULT_STARTUP_TIMEOUT_SECS};
use std::path::PathBuf;

/// Daemons are used by default.
pub const DEFAULT_DAEMON_ENABLED: bool = true;

/// Default pre-warm target per interpreter+environment key.
pub const DEFAULT_PREWARM_COUNT_SETTING: usize = crate::pool::DEFAULT_PREWARM_COUNT;

/// Default kernel output channel capacity.
pub const DEFAULT_OUTPUT_CHANNEL_CAPACITY_SETTING: usize =
    crate::exec::DEFAULT_OUTPUT_CHANNEL_CAPACITY;

/// Default log file name.
pub const DEFAULT_LOG_FILE_NAME: &str = "kernelhost.log";

/// Default log level when RUST_LOG is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log directory (~/.kernelhost/logs).
pub fn default_log_directory() -> PathBuf {
    super::file::config_directory().join("logs")
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_DAEMON_ENABLED,
            module: DEFAULT_DAEMON_MODULE.to_string(),
            prewarm_count: DEFAULT_PREWARM_COUNT_SETTING,
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
        }
    }
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            output_channel_capacity: DEFAULT_OUTPUT_CHANNEL_CAPACITY_SETTING,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_name: DEFAULT_LOG_FILE_NAME.to_string(),
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            daemon: DaemonSettings::default(),
            exec: ExecSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
