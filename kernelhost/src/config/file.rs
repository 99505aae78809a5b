//! Configuration file handling for ~/.kernelhost/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Settings
//! structs live in [`super::settings`], constants in [`super::defaults`].

use super::settings::*;
use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.kernelhost/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.kernelhost/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let ini = to_ini(self);
        ini.write_to_file(path)
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
        }
        Ok(path)
    }
}

/// Get the path to the config directory (~/.kernelhost).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kernelhost")
}

/// Get the path to the config file (~/.kernelhost/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

// =============================================================================
// Parsing
// =============================================================================

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("daemon")) {
        if let Some(value) = section.get("enabled") {
            config.daemon.enabled = parse_bool("daemon", "enabled", value)?;
        }
        if let Some(value) = section.get("module") {
            config.daemon.module = value.to_string();
        }
        if let Some(value) = section.get("prewarm_count") {
            config.daemon.prewarm_count = parse_number("daemon", "prewarm_count", value)?;
        }
        if let Some(value) = section.get("startup_timeout_secs") {
            config.daemon.startup_timeout_secs =
                parse_number("daemon", "startup_timeout_secs", value)?;
        }
    }

    if let Some(section) = ini.section(Some("exec")) {
        if let Some(value) = section.get("output_channel_capacity") {
            config.exec.output_channel_capacity =
                parse_number("exec", "output_channel_capacity", value)?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(value) = section.get("directory") {
            config.logging.directory = PathBuf::from(value);
        }
        if let Some(value) = section.get("file_name") {
            config.logging.file_name = value.to_string();
        }
        if let Some(value) = section.get("level") {
            config.logging.level = value.to_string();
        }
    }

    Ok(config)
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(
    section: &str,
    key: &str,
    value: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a number".to_string(),
        })
}

// =============================================================================
// Serialization
// =============================================================================

fn to_ini(config: &ConfigFile) -> Ini {
    let mut ini = Ini::new();

    ini.with_section(Some("daemon"))
        .set("enabled", config.daemon.enabled.to_string())
        .set("module", config.daemon.module.clone())
        .set("prewarm_count", config.daemon.prewarm_count.to_string())
        .set(
            "startup_timeout_secs",
            config.daemon.startup_timeout_secs.to_string(),
        );

    ini.with_section(Some("exec")).set(
        "output_channel_capacity",
        config.exec.output_channel_capacity.to_string(),
    );

    ini.with_section(Some("logging"))
        .set(
            "directory",
            config.logging.directory.display().to_string(),
        )
        .set("file_name", config.logging.file_name.clone())
        .set("level", config.logging.level.clone());

    ini
}
