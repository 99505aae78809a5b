//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use kernelhost::config::ConfigFileError;
use kernelhost::kernelspec::KernelSpecError;
use kernelhost::launcher::LaunchError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to load the kernel spec file
    Spec(KernelSpecError),
    /// Failed to launch the kernel
    Launch(LaunchError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Launch(LaunchError::UnsupportedKernelSpec { .. }) => {
                eprintln!();
                eprintln!("The kernel spec's argv must invoke a module, for example:");
                eprintln!("  \"argv\": [\"python\", \"-m\", \"ipykernel_launcher\", \"-f\", \"{{connection_file}}\"]");
            }
            CliError::Spec(_) => {
                eprintln!();
                eprintln!("Pass --kernel-spec the path of a kernel.json file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Spec(e) => write!(f, "Kernel spec error: {}", e),
            CliError::Launch(e) => write!(f, "Launch failed: {}", e),
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        Self::Config(e)
    }
}

impl From<KernelSpecError> for CliError {
    fn from(e: KernelSpecError) -> Self {
        Self::Spec(e)
    }
}

impl From<LaunchError> for CliError {
    fn from(e: LaunchError) -> Self {
        Self::Launch(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_launch_error() {
        let error = CliError::Launch(LaunchError::UnsupportedKernelSpec {
            argv: "wow".to_string(),
        });
        let message = error.to_string();
        assert!(message.starts_with("Launch failed: "));
        assert!(message.contains("Unsupported KernelSpec file"));
    }
}
