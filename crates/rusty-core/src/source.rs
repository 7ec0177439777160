//! The metadata source abstraction.

use crate::error::Result;
use crate::package::{Package, StatOutcome};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Read-only access to the package database and the filesystem.
///
/// Methods returning `Result` fail only when the underlying tool cannot be
/// used at all; such failures abort the scan. Per-file problems are reported
/// through [`StatOutcome`].
pub trait MetadataSource {
    /// Returns the unique identifier of this source (e.g., "pacman").
    fn source_id(&self) -> &str;

    /// All installed packages.
    fn list_packages(&self) -> Result<Vec<Package>>;

    /// Paths owned by `package`, as recorded in the package database.
    fn list_owned_files(&self, package: &Package) -> Result<Vec<PathBuf>>;

    /// Reads access/change times for `path`.
    fn stat_file(&self, path: &Path) -> StatOutcome;

    /// Packages that depend on `package`.
    fn list_reverse_dependencies(&self, package: &Package) -> Result<BTreeSet<Package>>;
}
