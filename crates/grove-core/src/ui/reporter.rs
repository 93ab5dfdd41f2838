//! Reporter trait for dependency injection
//!
//! This trait allows the engine to report import progress and warnings
//! without being coupled to a specific CLI or GUI implementation.

use crate::types::PackageName;

/// Receives progress and diagnostics during an import run.
pub trait Reporter: Send + Sync {
    /// A package checkout is starting.
    fn fetching(&self, name: &PackageName);

    /// An already-present package is being updated.
    fn updating(&self, name: &PackageName);

    /// A package was skipped, with a reason (`"checkout only"`, ...).
    fn skipped(&self, name: &PackageName, detail: &str);

    /// A package import finished successfully.
    fn done(&self, name: &PackageName, detail: &str);

    /// A package import failed with a specific reason.
    fn failed(&self, name: &PackageName, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Display a final summary of the run.
    fn summary(&self, imported: usize, failed: usize, elapsed_secs: f64);
}

/// A reporter that reports nothing. Useful for tests and embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn fetching(&self, _name: &PackageName) {}
    fn updating(&self, _name: &PackageName) {}
    fn skipped(&self, _name: &PackageName, _detail: &str) {}
    fn done(&self, _name: &PackageName, _detail: &str) {}
    fn failed(&self, _name: &PackageName, _reason: &str) {}
    fn info(&self, _msg: &str) {}
    fn warning(&self, _msg: &str) {}
    fn summary(&self, _imported: usize, _failed: usize, _elapsed_secs: f64) {}
}
