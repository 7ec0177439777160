//! Classifying packages as stale and rendering the report.

use crate::package::Package;
use crate::policy::ActivityPolicy;
use serde::Serialize;
use std::fmt;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days between `timestamp` and `now`, rounded down.
pub fn age_in_days(now: i64, timestamp: i64) -> i64 {
    (now - timestamp).div_euclid(SECONDS_PER_DAY)
}

/// One stale package. Entries order by age, then by package name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StaleEntry {
    pub age_days: i64,
    pub package: Package,
}

/// Keeps packages strictly older than `threshold_days`, sorted.
pub fn classify<'a, I>(effective: I, now: i64, threshold_days: i64) -> Vec<StaleEntry>
where
    I: IntoIterator<Item = (&'a Package, &'a i64)>,
{
    let mut entries: Vec<StaleEntry> = effective
        .into_iter()
        .map(|(package, &timestamp)| StaleEntry {
            age_days: age_in_days(now, timestamp),
            package: package.clone(),
        })
        .filter(|entry| entry.age_days > threshold_days)
        .collect();
    entries.sort();
    entries
}

/// The outcome of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleReport {
    pub policy: ActivityPolicy,
    pub threshold_days: i64,
    pub entries: Vec<StaleEntry>,
}

impl StaleReport {
    pub fn new(policy: ActivityPolicy, threshold_days: i64, entries: Vec<StaleEntry>) -> Self {
        Self {
            policy,
            threshold_days,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per stale package, in report order.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        let verb = self.policy.verb();
        self.entries.iter().map(move |entry| {
            format!(
                "package {} not {} for {} days.",
                entry.package, verb, entry.age_days
            )
        })
    }

    pub fn summary(&self) -> String {
        format!("Found {} rusty packages", self.entries.len())
    }
}

impl fmt::Display for StaleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        write!(f, "{}", self.summary())
    }
}
