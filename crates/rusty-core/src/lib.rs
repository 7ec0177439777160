//! Core types and the staleness engine for rusty-packages.
//!
//! This crate turns (package -> owned files -> file timestamps) into a report
//! of packages that have not been used or upgraded for a while. Talking to
//! the actual package manager is left to a [`MetadataSource`] implementation.

pub mod diagnostics;
pub mod error;
pub mod package;
pub mod policy;
pub mod propagate;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod source;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use diagnostics::{DiagnosticSink, RecordingSink, TracingSink, Warning};
pub use error::{Error, Result};
pub use package::{FileStat, Package, StatOutcome};
pub use policy::{
    parse_threshold, ActivityPolicy, Propagation, ScanFlags, ScanOptions, DEFAULT_THRESHOLD_DAYS,
};
pub use propagate::{DependencyPropagator, ReverseDependencyIndex};
pub use report::{age_in_days, classify, StaleEntry, StaleReport};
pub use resolver::ActivityResolver;
pub use scan::{ProgressCallback, ScanProgress, Scanner};
pub use source::MetadataSource;
