//! An in-memory [`MetadataSource`] for tests.

use crate::error::{Error, Result};
use crate::package::{FileStat, Package, StatOutcome};
use crate::source::MetadataSource;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// A metadata source backed by maps, counting the queries made against it.
#[derive(Debug, Default)]
pub struct MemorySource {
    packages: Vec<Package>,
    files: HashMap<Package, Vec<PathBuf>>,
    stats: HashMap<PathBuf, StatOutcome>,
    dependents: HashMap<Package, BTreeSet<Package>>,
    unavailable: bool,
    file_queries: RefCell<HashMap<Package, usize>>,
    stat_queries: RefCell<Vec<PathBuf>>,
    dependency_queries: RefCell<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an installed package owning no files yet.
    pub fn package(mut self, name: &str) -> Self {
        let package = Package::new(name);
        if !self.packages.contains(&package) {
            self.packages.push(package.clone());
        }
        self.files.entry(package).or_default();
        self
    }

    /// Adds a file to `package` with the given stat outcome.
    pub fn file(mut self, package: &str, path: &str, outcome: StatOutcome) -> Self {
        self = self.package(package);
        let path = PathBuf::from(path);
        self.files
            .entry(Package::new(package))
            .or_default()
            .push(path.clone());
        self.stats.insert(path, outcome);
        self
    }

    /// Adds a regular file with the given access and change times.
    pub fn regular_file(self, package: &str, path: &str, atime: i64, ctime: i64) -> Self {
        self.file(package, path, StatOutcome::Found(FileStat::regular(atime, ctime)))
    }

    /// Records that `dependent` depends on `package`.
    pub fn dependent(mut self, package: &str, dependent: &str) -> Self {
        self.dependents
            .entry(Package::new(package))
            .or_default()
            .insert(Package::new(dependent));
        self
    }

    /// Makes every database query fail as if pacman were missing.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// How many times the files of `package` were listed.
    pub fn file_queries(&self, package: &str) -> usize {
        self.file_queries.borrow().get(package).copied().unwrap_or(0)
    }

    /// Every path stat'ed so far, in order.
    pub fn stat_queries(&self) -> Vec<PathBuf> {
        self.stat_queries.borrow().clone()
    }

    pub fn dependency_queries(&self) -> usize {
        *self.dependency_queries.borrow()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::BackendUnavailable("memory source disabled".into()));
        }
        Ok(())
    }
}

impl MetadataSource for MemorySource {
    fn source_id(&self) -> &str {
        "memory"
    }

    fn list_packages(&self) -> Result<Vec<Package>> {
        self.check_available()?;
        Ok(self.packages.clone())
    }

    fn list_owned_files(&self, package: &Package) -> Result<Vec<PathBuf>> {
        self.check_available()?;
        *self
            .file_queries
            .borrow_mut()
            .entry(package.clone())
            .or_insert(0) += 1;
        Ok(self.files.get(package).cloned().unwrap_or_default())
    }

    fn stat_file(&self, path: &Path) -> StatOutcome {
        self.stat_queries.borrow_mut().push(path.to_path_buf());
        self.stats
            .get(path)
            .cloned()
            .unwrap_or(StatOutcome::NotFound)
    }

    fn list_reverse_dependencies(&self, package: &Package) -> Result<BTreeSet<Package>> {
        self.check_available()?;
        *self.dependency_queries.borrow_mut() += 1;
        Ok(self.dependents.get(package).cloned().unwrap_or_default())
    }
}
