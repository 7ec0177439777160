//! Warnings raised while scanning, and the sinks that receive them.

use crate::package::Package;
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// A recoverable condition noticed during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The package database lists a file that no longer exists.
    MissingFile { package: Package, path: PathBuf },
    /// A file could not be inspected for a reason other than permissions.
    UnreadableFile {
        package: Package,
        path: PathBuf,
        reason: String,
    },
    /// None of the package's files could be inspected; it is treated as just used.
    NoAccessibleFiles { package: Package },
}

impl Warning {
    pub fn package(&self) -> &Package {
        match self {
            Warning::MissingFile { package, .. }
            | Warning::UnreadableFile { package, .. }
            | Warning::NoAccessibleFiles { package } => package,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingFile { package, path } => {
                write!(f, "missing file: {} from {}", path.display(), package)
            }
            Warning::UnreadableFile {
                package,
                path,
                reason,
            } => write!(
                f,
                "could not inspect {} from {}: {}",
                path.display(),
                package,
                reason
            ),
            Warning::NoAccessibleFiles { package } => {
                write!(f, "could not access files from {}", package)
            }
        }
    }
}

/// Receives warnings from the resolver.
pub trait DiagnosticSink {
    fn warn(&self, warning: Warning);
}

/// Forwards warnings to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, warning: Warning) {
        warn!("Warning: {}", warning);
    }
}

/// Keeps every warning in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    warnings: RefCell<Vec<Warning>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.warnings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.borrow().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, warning: Warning) {
        self.warnings.borrow_mut().push(warning);
    }
}
