//! Interpreter runtime records.

use semver::Version;
use std::path::PathBuf;

/// Identifies a language runtime that can launch kernels.
///
/// The launch core treats this as opaque input: the pool keys daemons by
/// interpreter, and the execution fallback invokes the interpreter's
/// executable directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interpreter {
    /// Path to the interpreter executable.
    pub path: PathBuf,

    /// Interpreter version, when known.
    pub version: Option<Version>,

    /// Name of the environment this interpreter belongs to (e.g. a venv).
    pub env_name: Option<String>,
}

impl Interpreter {
    /// Creates an interpreter record for the given executable.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            version: None,
            env_name: None,
        }
    }

    /// Sets the interpreter version.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the environment name.
    pub fn with_env_name(mut self, env_name: impl Into<String>) -> Self {
        self.env_name = Some(env_name.into());
        self
    }
}

impl std::fmt::Display for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(version) = &self.version {
            write!(f, " ({})", version)?;
        }
        Ok(())
    }
}
