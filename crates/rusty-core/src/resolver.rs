//! Per-package activity resolution.

use crate::diagnostics::{DiagnosticSink, Warning};
use crate::error::Result;
use crate::package::{Package, StatOutcome};
use crate::policy::ActivityPolicy;
use crate::source::MetadataSource;
use std::collections::HashMap;
use tracing::debug;

/// Computes one representative timestamp per package from its files.
///
/// Results are memoized for the lifetime of the resolver, so asking for the
/// same package again (for instance as a dependent of several others) never
/// re-queries the source.
pub struct ActivityResolver<'a, S: MetadataSource + ?Sized> {
    source: &'a S,
    sink: &'a dyn DiagnosticSink,
    policy: ActivityPolicy,
    now: i64,
    cache: HashMap<Package, i64>,
}

impl<'a, S: MetadataSource + ?Sized> ActivityResolver<'a, S> {
    /// `now` is captured once by the caller and used for every fallback.
    pub fn new(
        source: &'a S,
        sink: &'a dyn DiagnosticSink,
        policy: ActivityPolicy,
        now: i64,
    ) -> Self {
        Self {
            source,
            sink,
            policy,
            now,
            cache: HashMap::new(),
        }
    }

    pub fn policy(&self) -> ActivityPolicy {
        self.policy
    }

    /// Returns the memoized timestamp for `package`, resolving it first if needed.
    pub fn resolve(&mut self, package: &Package) -> Result<i64> {
        if let Some(&timestamp) = self.cache.get(package) {
            return Ok(timestamp);
        }
        let timestamp = self.compute(package)?;
        self.cache.insert(package.clone(), timestamp);
        Ok(timestamp)
    }

    /// Timestamps resolved so far.
    pub fn resolved(&self) -> &HashMap<Package, i64> {
        &self.cache
    }

    fn compute(&self, package: &Package) -> Result<i64> {
        let files = self.source.list_owned_files(package)?;
        let mut latest: Option<i64> = None;

        for path in &files {
            let stat = match self.source.stat_file(path) {
                StatOutcome::Found(stat) if stat.is_regular => stat,
                StatOutcome::Found(_) | StatOutcome::PermissionDenied => continue,
                StatOutcome::NotFound => {
                    self.sink.warn(Warning::MissingFile {
                        package: package.clone(),
                        path: path.clone(),
                    });
                    continue;
                }
                StatOutcome::Failed(reason) => {
                    self.sink.warn(Warning::UnreadableFile {
                        package: package.clone(),
                        path: path.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let timestamp = match self.policy {
                ActivityPolicy::UsedSinceUpgrade if stat.used_since_change() => {
                    debug!("{} used since upgrade ({})", package, path.display());
                    return Ok(self.now);
                }
                ActivityPolicy::LastAccess | ActivityPolicy::UsedSinceUpgrade => stat.atime,
                ActivityPolicy::LastChange => stat.ctime,
            };
            latest = Some(latest.map_or(timestamp, |current| current.max(timestamp)));
        }

        match latest {
            Some(timestamp) => Ok(timestamp),
            None => {
                self.sink.warn(Warning::NoAccessibleFiles {
                    package: package.clone(),
                });
                Ok(self.now)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::package::FileStat;
    use crate::testing::MemorySource;

    const NOW: i64 = 1_700_000_000;

    fn resolve(source: &MemorySource, policy: ActivityPolicy, name: &str) -> (i64, RecordingSink) {
        let sink = RecordingSink::new();
        let timestamp = {
            let mut resolver = ActivityResolver::new(source, &sink, policy, NOW);
            resolver.resolve(&Package::new(name)).unwrap()
        };
        (timestamp, sink)
    }

    #[test]
    fn test_last_access_takes_maximum() {
        let source = MemorySource::new()
            .regular_file("vim", "/usr/bin/vim", 300, 10)
            .regular_file("vim", "/usr/share/vim/a", 900, 10)
            .regular_file("vim", "/usr/share/vim/b", 500, 10);
        let (timestamp, sink) = resolve(&source, ActivityPolicy::LastAccess, "vim");
        assert_eq!(timestamp, 900);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_last_access_independent_of_order() {
        let forward = MemorySource::new()
            .regular_file("p", "/a", 1, 0)
            .regular_file("p", "/b", 7, 0)
            .regular_file("p", "/c", 3, 0);
        let backward = MemorySource::new()
            .regular_file("p", "/c", 3, 0)
            .regular_file("p", "/b", 7, 0)
            .regular_file("p", "/a", 1, 0);
        assert_eq!(
            resolve(&forward, ActivityPolicy::LastAccess, "p").0,
            resolve(&backward, ActivityPolicy::LastAccess, "p").0
        );
    }

    #[test]
    fn test_last_change_uses_ctime() {
        let source = MemorySource::new()
            .regular_file("git", "/usr/bin/git", 9_000, 200)
            .regular_file("git", "/usr/lib/git", 9_000, 400);
        assert_eq!(resolve(&source, ActivityPolicy::LastChange, "git").0, 400);
    }

    #[test]
    fn test_non_regular_files_ignored() {
        let source = MemorySource::new()
            .regular_file("p", "/usr/bin/p", 100, 0)
            .file(
                "p",
                "/usr/share/p",
                StatOutcome::Found(FileStat {
                    atime: 5_000,
                    ctime: 0,
                    is_regular: false,
                }),
            );
        let (timestamp, sink) = resolve(&source, ActivityPolicy::LastAccess, "p");
        assert_eq!(timestamp, 100);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_missing_file_warns_and_is_skipped() {
        let source = MemorySource::new()
            .regular_file("p", "/usr/bin/p", 100, 0)
            .file("p", "/usr/bin/gone", StatOutcome::NotFound);
        let (timestamp, sink) = resolve(&source, ActivityPolicy::LastAccess, "p");
        assert_eq!(timestamp, 100);
        assert_eq!(
            sink.warnings(),
            vec![Warning::MissingFile {
                package: Package::new("p"),
                path: "/usr/bin/gone".into(),
            }]
        );
    }

    #[test]
    fn test_permission_denied_is_silent() {
        let source = MemorySource::new()
            .regular_file("sudo", "/usr/bin/sudo", 100, 0)
            .file("sudo", "/etc/sudoers", StatOutcome::PermissionDenied);
        let (timestamp, sink) = resolve(&source, ActivityPolicy::LastAccess, "sudo");
        assert_eq!(timestamp, 100);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_no_accessible_files_falls_back_to_now() {
        let source = MemorySource::new()
            .package("empty")
            .file("locked", "/root/secret", StatOutcome::PermissionDenied);

        let (timestamp, sink) = resolve(&source, ActivityPolicy::LastAccess, "empty");
        assert_eq!(timestamp, NOW);
        assert_eq!(sink.len(), 1);

        let (timestamp, sink) = resolve(&source, ActivityPolicy::LastChange, "locked");
        assert_eq!(timestamp, NOW);
        assert_eq!(
            sink.warnings(),
            vec![Warning::NoAccessibleFiles {
                package: Package::new("locked"),
            }]
        );
    }

    #[test]
    fn test_used_since_upgrade_short_circuits() {
        let source = MemorySource::new()
            .regular_file("d", "/a", 50, 100)
            .regular_file("d", "/b", 200, 100)
            .regular_file("d", "/c", 10, 100);
        let (timestamp, sink) = resolve(&source, ActivityPolicy::UsedSinceUpgrade, "d");
        assert_eq!(timestamp, NOW);
        assert!(sink.is_empty());
        let stats: Vec<_> = source.stat_queries();
        assert_eq!(stats, vec![std::path::PathBuf::from("/a"), "/b".into()]);
    }

    #[test]
    fn test_used_since_upgrade_falls_back_to_last_access() {
        let source = MemorySource::new()
            .regular_file("d", "/a", 50, 100)
            .regular_file("d", "/b", 100, 100);
        assert_eq!(resolve(&source, ActivityPolicy::UsedSinceUpgrade, "d").0, 100);
    }

    #[test]
    fn test_resolution_is_memoized() {
        let source = MemorySource::new().regular_file("p", "/p", 42, 0);
        let sink = RecordingSink::new();
        let mut resolver = ActivityResolver::new(&source, &sink, ActivityPolicy::LastAccess, NOW);
        let package = Package::new("p");
        assert_eq!(resolver.resolve(&package).unwrap(), 42);
        assert_eq!(resolver.resolve(&package).unwrap(), 42);
        assert_eq!(source.file_queries("p"), 1);
        assert_eq!(resolver.resolved().len(), 1);
    }

    #[test]
    fn test_fallback_warning_emitted_once_per_package() {
        let source = MemorySource::new().package("empty");
        let sink = RecordingSink::new();
        let mut resolver = ActivityResolver::new(&source, &sink, ActivityPolicy::LastAccess, NOW);
        let package = Package::new("empty");
        resolver.resolve(&package).unwrap();
        resolver.resolve(&package).unwrap();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_source_failure_propagates() {
        let source = MemorySource::new().package("p").unavailable();
        let sink = RecordingSink::new();
        let mut resolver = ActivityResolver::new(&source, &sink, ActivityPolicy::LastAccess, NOW);
        assert!(resolver.resolve(&Package::new("p")).is_err());
    }
}
