//! Parsers for pacman and pactree output.

use rusty_core::error::{Error, Result};
use rusty_core::package::Package;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Field in `pacman -Qi` output listing the packages that need this one.
const REQUIRED_BY: &str = "Required By";

/// `pacman -Q`: "name version" per line.
pub fn parse_installed(stdout: &str) -> Vec<Package> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(Package::new)
        .collect()
}

/// `pacman -Ql <pkg>`: "name /absolute/path" per line.
///
/// Everything after the first run of whitespace is the path, so paths
/// containing spaces survive.
pub fn parse_owned_files(command: &str, stdout: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
        let path = line
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim_start())
            .filter(|path| !path.is_empty())
            .ok_or_else(|| Error::Parse {
                command: command.to_string(),
                line: line.to_string(),
            })?;
        files.push(PathBuf::from(path));
    }
    Ok(files)
}

/// `pactree -rl <pkg>`: the queried package first, then one dependent per line.
pub fn parse_pactree(stdout: &str) -> BTreeSet<Package> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Package::new)
        .collect()
}

/// `pacman -Qi <pkg>`: the "Required By : a b c" field, or "None".
///
/// pacman wraps long values onto indented continuation lines.
pub fn parse_required_by(stdout: &str) -> BTreeSet<Package> {
    let mut dependents = BTreeSet::new();
    let mut in_field = false;

    for line in stdout.lines() {
        let value = if let Some(rest) = line.strip_prefix(REQUIRED_BY) {
            in_field = true;
            match rest.split_once(':') {
                Some((_, value)) => value,
                None => rest,
            }
        } else if in_field && line.starts_with(char::is_whitespace) {
            line
        } else if in_field {
            break;
        } else {
            continue;
        };

        dependents.extend(
            value
                .split_whitespace()
                .filter(|token| *token != "None")
                .map(Package::new),
        );
    }

    dependents
}
