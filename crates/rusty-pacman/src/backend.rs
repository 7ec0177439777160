//! pacman-backed metadata source.

use crate::parse::{parse_installed, parse_owned_files, parse_pactree, parse_required_by};
use rusty_core::{
    error::{Error, Result},
    package::{FileStat, Package, StatOutcome},
    source::MetadataSource,
};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const DEFAULT_PACMAN: &str = "pacman";
const DEFAULT_PACTREE: &str = "pactree";

/// Which query answers "who depends on this package".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReverseDepsQuery {
    /// `pactree -rl <pkg>` (from pacman-contrib); lists indirect dependents too.
    #[default]
    Pactree,
    /// The "Required By" field of `pacman -Qi <pkg>`; direct dependents only.
    QueryInfo,
}

/// Configuration for the pacman backend.
#[derive(Debug, Clone)]
pub struct PacmanConfig {
    /// pacman executable.
    pub pacman: String,
    /// pactree executable.
    pub pactree: String,
    pub reverse_deps: ReverseDepsQuery,
}

impl Default for PacmanConfig {
    fn default() -> Self {
        Self {
            pacman: DEFAULT_PACMAN.to_string(),
            pactree: DEFAULT_PACTREE.to_string(),
            reverse_deps: ReverseDepsQuery::default(),
        }
    }
}

/// Reads package metadata by running pacman and stat'ing files.
#[derive(Debug, Clone, Default)]
pub struct PacmanSource {
    config: PacmanConfig,
}

impl PacmanSource {
    /// Creates a new pacman source with default configuration.
    pub fn new() -> Self {
        Self::with_config(PacmanConfig::default())
    }

    /// Creates a new pacman source with custom configuration.
    pub fn with_config(config: PacmanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PacmanConfig {
        &self.config
    }

    /// Runs a query with the C locale and returns its stdout.
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        debug!("Running {}", command);

        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    Error::BackendUnavailable(format!("{} is not installed", program))
                }
                _ => Error::BackendUnavailable(format!("failed to run {}: {}", program, e)),
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Stats `path` without following symlinks.
pub fn stat_path(path: &Path) -> StatOutcome {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) => StatOutcome::Found(FileStat {
            atime: metadata.atime(),
            ctime: metadata.ctime(),
            is_regular: metadata.file_type().is_file(),
        }),
        Err(e) => match e.kind() {
            ErrorKind::NotFound => StatOutcome::NotFound,
            ErrorKind::PermissionDenied => StatOutcome::PermissionDenied,
            _ => StatOutcome::Failed(e.to_string()),
        },
    }
}

impl MetadataSource for PacmanSource {
    fn source_id(&self) -> &str {
        "pacman"
    }

    fn list_packages(&self) -> Result<Vec<Package>> {
        let stdout = self.run(&self.config.pacman, &["-Q"])?;
        Ok(parse_installed(&stdout))
    }

    fn list_owned_files(&self, package: &Package) -> Result<Vec<PathBuf>> {
        let stdout = self.run(&self.config.pacman, &["-Ql", package.name()])?;
        parse_owned_files(&format!("{} -Ql {}", self.config.pacman, package), &stdout)
    }

    fn stat_file(&self, path: &Path) -> StatOutcome {
        stat_path(path)
    }

    fn list_reverse_dependencies(&self, package: &Package) -> Result<BTreeSet<Package>> {
        match self.config.reverse_deps {
            ReverseDepsQuery::Pactree => {
                let stdout = self.run(&self.config.pactree, &["-rl", package.name()])?;
                Ok(parse_pactree(&stdout))
            }
            ReverseDepsQuery::QueryInfo => {
                let stdout = self.run(&self.config.pacman, &["-Qi", package.name()])?;
                Ok(parse_required_by(&stdout))
            }
        }
    }
}
