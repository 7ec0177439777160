//! Folding package times through the reverse-dependency graph.

use crate::error::Result;
use crate::package::Package;
use crate::policy::Propagation;
use crate::resolver::ActivityResolver;
use crate::source::MetadataSource;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Direct dependents of each package, as reported by the metadata source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseDependencyIndex {
    dependents: HashMap<Package, BTreeSet<Package>>,
}

impl ReverseDependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries the source once per package.
    pub fn build<S: MetadataSource + ?Sized>(source: &S, packages: &[Package]) -> Result<Self> {
        let mut index = Self::new();
        for package in packages {
            index.insert(package.clone(), source.list_reverse_dependencies(package)?);
        }
        Ok(index)
    }

    pub fn insert(&mut self, package: Package, dependents: BTreeSet<Package>) {
        self.dependents.insert(package, dependents);
    }

    /// Packages depending on `package`; empty if it was never indexed.
    pub fn dependents<'s>(&'s self, package: &Package) -> impl Iterator<Item = &'s Package> + 's {
        self.dependents.get(package).into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}

/// Computes effective timestamps from base timestamps.
///
/// Only base (never effective) times of other packages are read, so the
/// result does not depend on evaluation order and cycles cannot recurse.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyPropagator {
    mode: Propagation,
}

impl DependencyPropagator {
    pub fn new(mode: Propagation) -> Self {
        Self { mode }
    }

    /// Effective timestamp of one package.
    ///
    /// Dependents that have not been resolved yet are resolved on demand
    /// through the memoizing resolver.
    pub fn effective<S: MetadataSource + ?Sized>(
        &self,
        package: &Package,
        resolver: &mut ActivityResolver<'_, S>,
        index: &ReverseDependencyIndex,
    ) -> Result<i64> {
        let mut timestamp = resolver.resolve(package)?;

        match self.mode {
            Propagation::Disabled => {}
            Propagation::Direct => {
                for dependent in index.dependents(package) {
                    timestamp = timestamp.max(resolver.resolve(dependent)?);
                }
            }
            Propagation::Transitive => {
                let mut visited: HashSet<&Package> = HashSet::from([package]);
                let mut pending: Vec<&Package> = vec![package];
                while let Some(current) = pending.pop() {
                    for dependent in index.dependents(current) {
                        if visited.insert(dependent) {
                            timestamp = timestamp.max(resolver.resolve(dependent)?);
                            pending.push(dependent);
                        }
                    }
                }
            }
        }

        Ok(timestamp)
    }

    /// Effective timestamps for every package in `packages`.
    pub fn effective_all<S: MetadataSource + ?Sized>(
        &self,
        packages: &[Package],
        resolver: &mut ActivityResolver<'_, S>,
        index: &ReverseDependencyIndex,
    ) -> Result<BTreeMap<Package, i64>> {
        let mut effective = BTreeMap::new();
        for package in packages {
            effective.insert(package.clone(), self.effective(package, resolver, index)?);
        }
        Ok(effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::policy::ActivityPolicy;
    use crate::testing::MemorySource;

    const NOW: i64 = 1_000_000;

    /// a <- b <- c, plus a cycle between x and y.
    fn graph() -> MemorySource {
        MemorySource::new()
            .regular_file("a", "/a", 100, 0)
            .regular_file("b", "/b", 200, 0)
            .regular_file("c", "/c", 900, 0)
            .regular_file("x", "/x", 10, 0)
            .regular_file("y", "/y", 20, 0)
            .dependent("a", "b")
            .dependent("b", "c")
            .dependent("x", "y")
            .dependent("y", "x")
    }

    fn effective(source: &MemorySource, mode: Propagation, name: &str) -> i64 {
        let sink = RecordingSink::new();
        let packages = source.list_packages().unwrap();
        let index = ReverseDependencyIndex::build(source, &packages).unwrap();
        let mut resolver = ActivityResolver::new(source, &sink, ActivityPolicy::LastAccess, NOW);
        DependencyPropagator::new(mode)
            .effective(&Package::new(name), &mut resolver, &index)
            .unwrap()
    }

    #[test]
    fn test_disabled_is_identity() {
        let source = graph();
        assert_eq!(effective(&source, Propagation::Disabled, "a"), 100);
        assert_eq!(effective(&source, Propagation::Disabled, "b"), 200);
    }

    #[test]
    fn test_direct_is_one_hop() {
        let source = graph();
        assert_eq!(effective(&source, Propagation::Direct, "a"), 200);
        assert_eq!(effective(&source, Propagation::Direct, "b"), 900);
    }

    #[test]
    fn test_transitive_follows_chain() {
        let source = graph();
        assert_eq!(effective(&source, Propagation::Transitive, "a"), 900);
        assert_eq!(effective(&source, Propagation::Transitive, "c"), 900);
    }

    #[test]
    fn test_cycles_terminate() {
        let source = graph();
        for mode in [Propagation::Direct, Propagation::Transitive] {
            assert_eq!(effective(&source, mode, "x"), 20);
            assert_eq!(effective(&source, mode, "y"), 20);
        }
    }

    #[test]
    fn test_monotonic_and_idempotent() {
        let source = graph();
        let sink = RecordingSink::new();
        let packages = source.list_packages().unwrap();
        let index = ReverseDependencyIndex::build(&source, &packages).unwrap();
        let mut resolver = ActivityResolver::new(&source, &sink, ActivityPolicy::LastAccess, NOW);

        for mode in [Propagation::Direct, Propagation::Transitive] {
            let propagator = DependencyPropagator::new(mode);
            let first = propagator.effective_all(&packages, &mut resolver, &index).unwrap();
            let second = propagator.effective_all(&packages, &mut resolver, &index).unwrap();
            assert_eq!(first, second);

            for package in &packages {
                let base = resolver.resolve(package).unwrap();
                assert!(first[package] >= base);
                for dependent in index.dependents(package) {
                    assert!(first[package] >= resolver.resolve(dependent).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_shared_dependent_resolved_once() {
        let source = MemorySource::new()
            .regular_file("lib1", "/lib1", 1, 0)
            .regular_file("lib2", "/lib2", 2, 0)
            .regular_file("app", "/app", 50, 0)
            .dependent("lib1", "app")
            .dependent("lib2", "app");
        let sink = RecordingSink::new();
        let packages = source.list_packages().unwrap();
        let index = ReverseDependencyIndex::build(&source, &packages).unwrap();
        let mut resolver = ActivityResolver::new(&source, &sink, ActivityPolicy::LastAccess, NOW);
        let effective = DependencyPropagator::new(Propagation::Direct)
            .effective_all(&packages, &mut resolver, &index)
            .unwrap();
        assert_eq!(effective["lib1"], 50);
        assert_eq!(effective["lib2"], 50);
        assert_eq!(source.file_queries("app"), 1);
    }

    #[test]
    fn test_unindexed_dependent_is_resolved_on_demand() {
        let source = MemorySource::new()
            .regular_file("base", "/base", 1, 0)
            .regular_file("extra", "/extra", 70, 0);
        let mut index = ReverseDependencyIndex::new();
        index.insert(Package::new("base"), BTreeSet::from([Package::new("extra")]));
        let sink = RecordingSink::new();
        let mut resolver = ActivityResolver::new(&source, &sink, ActivityPolicy::LastAccess, NOW);
        let timestamp = DependencyPropagator::new(Propagation::Direct)
            .effective(&Package::new("base"), &mut resolver, &index)
            .unwrap();
        assert_eq!(timestamp, 70);
        assert_eq!(index.len(), 1);
    }
}
