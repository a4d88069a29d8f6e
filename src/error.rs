//! Error types for duty

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::runner::LaunchError;
use crate::validation::BindingError;

/// Result type alias for duty operations
pub type Result<T> = std::result::Result<T, DutyError>;

/// Main error type for duty
#[derive(Error, Debug)]
pub enum DutyError {
    /// Duties file and declaration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Arguments that do not fit a duty's signature
    #[error("{0}")]
    Binding(#[from] BindingError),

    /// A duty name or alias that is not in the collection
    #[error("Unknown duty '{0}'")]
    UnknownDuty(String),

    /// A command or duty signaled failure with an exit code
    #[error(transparent)]
    Failure(#[from] DutyFailure),

    /// A pre/post duty referenced by name outside of any collection
    #[error("Can't find duty by name without a collection ({0})")]
    NoCollection(String),

    /// A command could not be launched at all
    #[error("Launch error: {0}")]
    Launch(LaunchError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DutyError {
    /// Process exit code this error maps to.
    ///
    /// Failures keep the code of the command that failed, everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            DutyError::Failure(failure) => failure.code,
            _ => 1,
        }
    }
}

impl From<LaunchError> for DutyError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::Interrupted => DutyError::Failure(DutyFailure::interrupted()),
            other => DutyError::Launch(other),
        }
    }
}

/// Raised when a command run by a duty exits with a non-zero code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Duty failed with exit code {code}")]
pub struct DutyFailure {
    /// The exit code of the command that failed.
    pub code: i32,
}

impl DutyFailure {
    /// Exit code used when the user interrupts a command (SIGINT).
    pub const INTERRUPTED: i32 = 130;

    pub fn new(code: i32) -> Self {
        DutyFailure { code }
    }

    pub fn interrupted() -> Self {
        DutyFailure::new(Self::INTERRUPTED)
    }
}

/// Duties file parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find duties file (searched: {0})")]
    NotFound(String),

    #[error("Failed to read duties file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid signature for '{duty}': {reason}")]
    InvalidSignature { duty: String, reason: String },

    #[error("Unknown type annotation '{0}'")]
    UnknownType(String),

    #[error("Duty '{0}' is not defined")]
    DutyNotFound(String),

    #[error("Alias '{alias}' is already used by duty '{duty}'")]
    DuplicateAlias { alias: String, duty: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_exit_code() {
        let err = DutyError::from(DutyFailure::new(3));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        assert_eq!(DutyError::UnknownDuty("nope".into()).exit_code(), 1);
        assert_eq!(DutyError::NoCollection("pre".into()).exit_code(), 1);
    }

    #[test]
    fn test_interrupt_maps_to_130() {
        let err = DutyError::from(LaunchError::Interrupted);
        assert!(matches!(err, DutyError::Failure(DutyFailure { code: 130 })));
    }
}
