//! One full pass over the installed packages.

use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::package::Package;
use crate::policy::ScanOptions;
use crate::propagate::{DependencyPropagator, ReverseDependencyIndex};
use crate::report::{classify, StaleReport};
use crate::resolver::ActivityResolver;
use crate::source::MetadataSource;
use tracing::{debug, info};

/// Progress of a scan, reported once per package before it is resolved.
#[derive(Debug, Clone, Copy)]
pub struct ScanProgress<'p> {
    /// Zero-based position of `package`.
    pub index: usize,
    pub total: usize,
    pub package: &'p Package,
}

/// Callback for scan progress.
pub type ProgressCallback<'a> = Box<dyn FnMut(ScanProgress<'_>) + 'a>;

/// Resolves, propagates and classifies every installed package.
pub struct Scanner<'a, S: MetadataSource + ?Sized> {
    source: &'a S,
    sink: &'a dyn DiagnosticSink,
    options: ScanOptions,
    now: i64,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a, S: MetadataSource + ?Sized> Scanner<'a, S> {
    pub fn new(
        source: &'a S,
        sink: &'a dyn DiagnosticSink,
        options: ScanOptions,
        now: i64,
    ) -> Self {
        Self {
            source,
            sink,
            options,
            now,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn run(mut self) -> Result<StaleReport> {
        let packages = self.source.list_packages()?;
        let total = packages.len();

        let mut resolver =
            ActivityResolver::new(self.source, self.sink, self.options.policy, self.now);
        info!(
            "Scanning {} packages from {} ({}, {:?} propagation)",
            total,
            self.source.source_id(),
            resolver.policy(),
            self.options.propagation
        );

        for (position, package) in packages.iter().enumerate() {
            if let Some(progress) = self.progress.as_mut() {
                progress(ScanProgress {
                    index: position,
                    total,
                    package,
                });
            }

            let timestamp = resolver.resolve(package)?;
            debug!("{} -> {}", package, timestamp);
        }

        let index = if self.options.propagation.is_enabled() {
            ReverseDependencyIndex::build(self.source, &packages)?
        } else {
            ReverseDependencyIndex::new()
        };

        let effective = DependencyPropagator::new(self.options.propagation).effective_all(
            &packages,
            &mut resolver,
            &index,
        )?;
        let entries = classify(&effective, self.now, self.options.threshold_days);

        Ok(StaleReport::new(
            self.options.policy,
            self.options.threshold_days,
            entries,
        ))
    }
}
