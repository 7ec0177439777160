//! Scan policies and validated scan options.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Threshold used when `--time` is not given.
pub const DEFAULT_THRESHOLD_DAYS: i64 = 30;

/// How a package's representative time is derived from its files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPolicy {
    /// Most recent access time over regular files.
    #[default]
    LastAccess,
    /// Most recent change time over regular files.
    LastChange,
    /// "Now" if any regular file was read after its last change, otherwise
    /// the same as [`ActivityPolicy::LastAccess`].
    UsedSinceUpgrade,
}

impl ActivityPolicy {
    /// The word used in report lines ("not used" / "not upgraded").
    pub fn verb(self) -> &'static str {
        match self {
            ActivityPolicy::LastChange => "upgraded",
            ActivityPolicy::LastAccess | ActivityPolicy::UsedSinceUpgrade => "used",
        }
    }
}

impl fmt::Display for ActivityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityPolicy::LastAccess => write!(f, "last-access"),
            ActivityPolicy::LastChange => write!(f, "last-change"),
            ActivityPolicy::UsedSinceUpgrade => write!(f, "used-since-upgrade"),
        }
    }
}

/// Whether and how far package times are folded through reverse dependencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    #[default]
    Disabled,
    /// Fold the base times of the packages listed as direct dependents.
    Direct,
    /// Fold the base times of every package reachable through dependents.
    Transitive,
}

impl Propagation {
    pub fn is_enabled(self) -> bool {
        self != Propagation::Disabled
    }
}

/// Parses the `--time` argument; anything but a whole number of days is invalid.
pub fn parse_threshold(raw: &str) -> Result<i64> {
    raw.trim().parse().map_err(|_| {
        Error::InvalidConfig(format!(
            "--time needs to be a whole number of days, got {:?}",
            raw
        ))
    })
}

/// Raw flag values as they come off the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFlags {
    pub follow_deps: bool,
    pub transitive: bool,
    pub since_upgrade: bool,
    pub last_upgraded: bool,
    pub time_days: i64,
}

impl Default for ScanFlags {
    fn default() -> Self {
        Self {
            follow_deps: false,
            transitive: false,
            since_upgrade: false,
            last_upgraded: false,
            time_days: DEFAULT_THRESHOLD_DAYS,
        }
    }
}

/// Validated options for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub policy: ActivityPolicy,
    pub propagation: Propagation,
    /// Packages strictly older than this many days are reported.
    pub threshold_days: i64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            policy: ActivityPolicy::default(),
            propagation: Propagation::default(),
            threshold_days: DEFAULT_THRESHOLD_DAYS,
        }
    }
}

impl ScanOptions {
    /// Checks flag combinations and builds the options.
    ///
    /// Must be called before any metadata query is made.
    pub fn from_flags(flags: &ScanFlags) -> Result<Self> {
        if flags.time_days < 0 {
            return Err(Error::InvalidConfig("--time needs to be 0 at least".into()));
        }
        if flags.since_upgrade && flags.last_upgraded {
            return Err(Error::InvalidConfig(
                "--since-upgrade and --last-upgraded are mutually exclusive".into(),
            ));
        }
        if flags.follow_deps && flags.last_upgraded {
            return Err(Error::InvalidConfig(
                "--follow-deps and --last-upgraded are mutually exclusive".into(),
            ));
        }
        if flags.transitive && !flags.follow_deps {
            return Err(Error::InvalidConfig(
                "--transitive requires --follow-deps".into(),
            ));
        }

        let policy = if flags.last_upgraded {
            ActivityPolicy::LastChange
        } else if flags.since_upgrade {
            ActivityPolicy::UsedSinceUpgrade
        } else {
            ActivityPolicy::LastAccess
        };

        let propagation = match (flags.follow_deps, flags.transitive) {
            (false, _) => Propagation::Disabled,
            (true, false) => Propagation::Direct,
            (true, true) => Propagation::Transitive,
        };

        Ok(Self {
            policy,
            propagation,
            threshold_days: flags.time_days,
        })
    }
}
