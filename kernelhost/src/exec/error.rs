//! Execution errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from spawning and observing processes.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The process could not be spawned.
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that was being launched.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A requested stdio pipe was not available on the spawned child.
    #[error("Spawned process is missing a {0} pipe")]
    MissingStdio(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_display_names_program() {
        let err = ExecError::Spawn {
            program: PathBuf::from("/usr/bin/python3"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let message = err.to_string();
        assert!(message.contains("/usr/bin/python3"));
        assert!(message.contains("no such file"));
    }

    #[test]
    fn test_missing_stdio_display() {
        let err = ExecError::MissingStdio("stdout");
        assert_eq!(err.to_string(), "Spawned process is missing a stdout pipe");
    }
}
