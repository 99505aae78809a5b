//! Kernel specification records loaded from `kernel.json`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading a kernel spec file.
#[derive(Debug, Error)]
pub enum KernelSpecError {
    /// The spec file could not be read.
    #[error("Failed to read kernel spec {path}: {source}")]
    Read {
        /// Path of the spec file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The spec file is not valid kernel-spec JSON.
    #[error("Failed to parse kernel spec {path}: {source}")]
    Parse {
        /// Path of the spec file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// How a kernel prefers to be interrupted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptMode {
    /// Interrupt by sending SIGINT to the kernel process.
    #[default]
    Signal,

    /// Interrupt via a kernel-protocol message.
    Message,
}

/// A kernel specification: the invocation template for a kernel process.
///
/// Mirrors the `kernel.json` format. The `argv` field is the invocation
/// template, e.g. `["python", "-m", "ipykernel_launcher", "-f",
/// "connection.json"]`; everything else is descriptive pass-through that
/// the launch core does not interpret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    /// Ordered invocation template.
    pub argv: Vec<String>,

    /// Human-readable kernel name.
    pub display_name: String,

    /// Kernel language (e.g. "python").
    pub language: String,

    /// Process environment overrides for the kernel.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Preferred interrupt mechanism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_mode: Option<InterruptMode>,

    /// Source file this spec was loaded from, when applicable.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl KernelSpec {
    /// Creates a spec from its invocation template and metadata.
    pub fn new(
        argv: Vec<String>,
        display_name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            argv,
            display_name: display_name.into(),
            language: language.into(),
            env: HashMap::new(),
            interrupt_mode: None,
            path: None,
        }
    }

    /// Sets the environment overrides.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Loads a spec from a `kernel.json` file.
    pub fn from_file(path: &Path) -> Result<Self, KernelSpecError> {
        let contents = std::fs::read_to_string(path).map_err(|source| KernelSpecError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut spec: Self =
            serde_json::from_str(&contents).map_err(|source| KernelSpecError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        spec.path = Some(path.to_path_buf());
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "argv": ["python", "-m", "ipykernel_launcher", "-f", "{connection_file}"],
        "display_name": "Python 3",
        "language": "python",
        "env": {"PYTHONUNBUFFERED": "1"},
        "interrupt_mode": "signal"
    }"#;

    #[test]
    fn test_parse_kernel_json() {
        let spec: KernelSpec = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(spec.argv[0], "python");
        assert_eq!(spec.display_name, "Python 3");
        assert_eq!(spec.language, "python");
        assert_eq!(spec.env.get("PYTHONUNBUFFERED"), Some(&"1".to_string()));
        assert_eq!(spec.interrupt_mode, Some(InterruptMode::Signal));
        assert_eq!(spec.path, None);
    }

    #[test]
    fn test_env_defaults_empty() {
        let spec: KernelSpec = serde_json::from_str(
            r#"{"argv": ["r"], "display_name": "R", "language": "r"}"#,
        )
        .unwrap();
        assert!(spec.env.is_empty());
        assert_eq!(spec.interrupt_mode, None);
    }

    #[test]
    fn test_from_file_records_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let spec = KernelSpec::from_file(file.path()).unwrap();
        assert_eq!(spec.path.as_deref(), Some(file.path()));
        assert_eq!(spec.display_name, "Python 3");
    }

    #[test]
    fn test_from_file_missing() {
        let err = KernelSpec::from_file(Path::new("/nonexistent/kernel.json")).unwrap_err();
        assert!(matches!(err, KernelSpecError::Read { .. }));
    }

    #[test]
    fn test_from_file_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let err = KernelSpec::from_file(file.path()).unwrap_err();
        assert!(matches!(err, KernelSpecError::Parse { .. }));
    }
}
