//! Configuration for KernelHost components.
//!
//! Settings structs live in [`settings`], default constants in
//! [`defaults`], and INI file I/O in [`file`]. Configuration is loaded
//! from `~/.kernelhost/config.ini`; a missing file yields defaults, and
//! unknown keys are ignored so configs survive version changes.

mod defaults;
mod file;
mod settings;

pub use defaults::{
    DEFAULT_DAEMON_ENABLED, DEFAULT_LOG_FILE_NAME, DEFAULT_LOG_LEVEL,
    DEFAULT_OUTPUT_CHANNEL_CAPACITY_SETTING, DEFAULT_PREWARM_COUNT_SETTING,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, DaemonSettings, ExecSettings, LoggingSettings};
