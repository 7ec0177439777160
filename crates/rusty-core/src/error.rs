//! Error types for rusty-packages.

use thiserror::Error;

/// The main error type for rusty-packages operations.
///
/// Only configuration problems and an unusable metadata source end up here.
/// Per-file and per-package conditions are reported through a
/// [`DiagnosticSink`](crate::diagnostics::DiagnosticSink) instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    #[error("Command `{command}` failed with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected output from `{command}`: {line:?}")]
    Parse { command: String, line: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error was raised before any metadata query was made.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }
}

/// A type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
