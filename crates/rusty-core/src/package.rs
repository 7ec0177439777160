//! Package and file metadata types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// An installed package, identified by name.
///
/// Names are unique within one scan; nothing else about the package is needed
/// to decide whether it went stale.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Package(String);

impl Package {
    /// Creates a new Package.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Package {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Package {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for Package {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Timestamps read from a single path, as Unix epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Last access time.
    pub atime: i64,
    /// Last inode change time (content or metadata), which is what an upgrade bumps.
    pub ctime: i64,
    /// Only regular files carry meaningful access/change times.
    pub is_regular: bool,
}

impl FileStat {
    pub fn regular(atime: i64, ctime: i64) -> Self {
        Self {
            atime,
            ctime,
            is_regular: true,
        }
    }

    /// Whether the file was read after it was last written.
    pub fn used_since_change(&self) -> bool {
        self.atime > self.ctime
    }
}

/// Outcome of looking up one path on the live filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatOutcome {
    Found(FileStat),
    /// The package database lists the path but it is gone.
    NotFound,
    /// Expected for protected system paths.
    PermissionDenied,
    /// Any other failure; the path is skipped with a warning.
    Failed(String),
}
