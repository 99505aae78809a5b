//! Invocation-template normalization.

use super::error::LaunchError;

/// A kernel spec's argv template split into module and residual args.
///
/// Kernel specs invoke their kernel as `interpreter -m module args...`;
/// launching through a daemon or execution service needs the module name
/// and the residual arguments separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchArgs {
    /// The module named after `-m`.
    pub module: String,

    /// Every token after the module name, in original order.
    pub residual: Vec<String>,
}

impl LaunchArgs {
    /// Splits an argv template at its `-m <module>` tokens.
    ///
    /// Scans for the first exact `-m` token; the following token is the
    /// module name and everything after it is residual. Anything else in
    /// the template (interpreter path, unknown flags before `-m`) is
    /// deliberately not validated.
    ///
    /// Pure and idempotent; fails fast with
    /// [`LaunchError::UnsupportedKernelSpec`] when the template lacks the
    /// `-m <module>` shape.
    pub fn from_argv(argv: &[String]) -> Result<Self, LaunchError> {
        match argv.iter().position(|token| token == "-m") {
            Some(index) if index + 1 < argv.len() => Ok(Self {
                module: argv[index + 1].clone(),
                residual: argv[index + 2..].to_vec(),
            }),
            _ => Err(LaunchError::UnsupportedKernelSpec {
                argv: argv.join(", "),
            }),
        }
    }
}
