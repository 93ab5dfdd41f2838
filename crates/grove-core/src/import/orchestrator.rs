//! Concurrent import of selected source packages.
//!
//! Packages are independent import units: importing one never requires a
//! dependency's sources to already be on disk, so the whole closure goes
//! into a bounded worker pool with no topological ordering. The graph
//! and resolver are read-only during the run; the only aggregation point
//! is the single collector loop draining worker results.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::graph::engine::{SelectError, SelectionEngine};
use crate::graph::{PackageNode, PackageSelection};
use crate::import::importer::{
    ImportError, Importer, ResetMode, SnapshotOptions, StatusReport, UpdateOptions,
};
use crate::types::PackageName;
use crate::ui::Reporter;

/// Provides the per-package [`Importer`] instances an import run needs.
///
/// Instances are handed out per package and never shared across workers.
pub trait ImporterFactory: Send + Sync {
    /// The importer for one package, or `None` if the package has no
    /// import source configured.
    fn importer_for(&self, node: &PackageNode) -> Option<Arc<dyn Importer>>;
}

/// Options controlling an import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Bounded worker count.
    pub parallelism: usize,
    /// Skip updating packages that are already checked out.
    pub checkout_only: bool,
    /// Forbid network access; updates needing it fail instead.
    pub only_local: bool,
    /// Reset policy for diverged checkouts.
    pub reset: ResetMode,
    /// Immediate retries per unit for retryable failures.
    pub retry_count: u32,
    /// Run every unit to completion instead of aborting unscheduled work
    /// on the first failure.
    pub keep_going: bool,
    /// Convert import failures into workspace exclusions instead of
    /// failing the run. Never the default.
    pub auto_exclude: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            parallelism: num_cpus::get(),
            checkout_only: false,
            only_local: false,
            reset: ResetMode::None,
            retry_count: 0,
            keep_going: false,
            auto_exclude: false,
        }
    }
}

/// One package's terminal failure in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    /// The failed package.
    pub package: PackageName,
    /// Human-readable failure reason.
    pub reason: String,
    /// Whether the failure was transient.
    pub retryable: bool,
}

/// Aggregate outcome of an import run. Failures never drop successes:
/// the succeeded set stays usable whatever else happened.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Packages whose sources are now present and current, in name
    /// order. Includes packages skipped as already checked out.
    pub succeeded: Vec<PackageNode>,
    /// OS packages still needing installation, computed from the
    /// succeeded subset only plus explicit osdep selections.
    pub osdeps_needed: BTreeSet<String>,
    /// Per-package terminal failures.
    pub failures: Vec<ImportFailure>,
    /// Exclusions produced by auto-exclude mode, for the caller to apply
    /// to its graph (the graph is read-only during the run).
    pub auto_excluded: BTreeMap<PackageName, String>,
}

/// Errors raised by [`ImportOrchestrator::run`]. Both aggregate variants
/// carry the partial report so callers need not discard good work.
#[derive(Error, Debug)]
pub enum ImportRunError {
    /// One or more units failed.
    #[error("{} package(s) failed to import ({} succeeded)", .report.failures.len(), .report.succeeded.len())]
    Failures {
        /// The partial report, successes included.
        report: ImportReport,
    },

    /// The run was interrupted; completed work is preserved.
    #[error("import interrupted after {} package(s) completed", .report.succeeded.len())]
    Interrupted {
        /// The partial report at the point of interruption.
        report: ImportReport,
    },

    /// Expanding the selection failed before any import started.
    #[error(transparent)]
    Selection(#[from] SelectError),
}

impl ImportRunError {
    /// The partial report, when the run got far enough to have one.
    pub fn report(&self) -> Option<&ImportReport> {
        match self {
            Self::Failures { report } | Self::Interrupted { report } => Some(report),
            Self::Selection(_) => None,
        }
    }
}

enum UnitDone {
    Imported,
    Updated,
    Skipped(&'static str),
}

enum UnitOutcome {
    Finished {
        node: PackageNode,
        result: Result<UnitDone, ImportError>,
    },
    NotScheduled,
}

/// Drives concurrent import/update of a selection's source closure.
pub struct ImportOrchestrator<'a, R: Reporter + Clone + 'static> {
    engine: SelectionEngine<'a>,
    importers: &'a dyn ImporterFactory,
    reporter: R,
}

impl<R: Reporter + Clone + 'static> std::fmt::Debug for ImportOrchestrator<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportOrchestrator").finish_non_exhaustive()
    }
}

impl<'a, R: Reporter + Clone + 'static> ImportOrchestrator<'a, R> {
    /// Create an orchestrator over a selection engine and an importer
    /// source.
    pub fn new(
        engine: SelectionEngine<'a>,
        importers: &'a dyn ImporterFactory,
        reporter: R,
    ) -> Self {
        Self {
            engine,
            importers,
            reporter,
        }
    }

    /// Import every source package the selection needs.
    ///
    /// The cancellation token stops submission immediately, lets
    /// in-flight units drain, and surfaces as
    /// [`ImportRunError::Interrupted`] with the partial report; it is
    /// never folded into the failure list.
    pub async fn run(
        &self,
        selection: &PackageSelection,
        opts: &ImportOptions,
        cancel: &CancellationToken,
    ) -> Result<ImportReport, ImportRunError> {
        let nodes = self.engine.all_selected_source_packages(selection)?;
        let started = Instant::now();

        let semaphore = Arc::new(Semaphore::new(opts.parallelism.max(1)));
        let abort = Arc::new(AtomicBool::new(false));
        let mut set: JoinSet<UnitOutcome> = JoinSet::new();

        tracing::debug!(
            packages = nodes.len(),
            parallelism = opts.parallelism,
            "starting import"
        );

        for node in &nodes {
            let importer = self.importers.importer_for(node);
            let node = node.clone();
            let semaphore = Arc::clone(&semaphore);
            let abort = Arc::clone(&abort);
            let cancel = cancel.clone();
            let reporter = self.reporter.clone();
            let opts = opts.clone();

            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return UnitOutcome::NotScheduled;
                };
                if abort.load(Ordering::Relaxed) || cancel.is_cancelled() {
                    return UnitOutcome::NotScheduled;
                }

                let result = match importer {
                    Some(importer) => {
                        import_one(&node, importer.as_ref(), &opts, &cancel, &reporter).await
                    }
                    None => Err(ImportError::fatal(
                        "no import source configured for this package",
                    )),
                };

                match &result {
                    Ok(UnitDone::Imported) => reporter.done(&node.name, "checked out"),
                    Ok(UnitDone::Updated) => reporter.done(&node.name, "updated"),
                    Ok(UnitDone::Skipped(detail)) => reporter.skipped(&node.name, detail),
                    Err(ImportError::Cancelled) => {}
                    Err(e) => {
                        reporter.failed(&node.name, &e.to_string());
                        if !opts.keep_going {
                            abort.store(true, Ordering::Relaxed);
                        }
                    }
                }

                UnitOutcome::Finished { node, result }
            });
        }

        let mut report = ImportReport::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(UnitOutcome::Finished { node, result }) => match result {
                    Ok(_) => report.succeeded.push(node),
                    Err(ImportError::Cancelled) => {}
                    Err(e) => {
                        if opts.auto_exclude {
                            self.reporter.warning(&format!(
                                "excluding '{}' from the workspace: {e}",
                                node.name
                            ));
                            report.auto_excluded.insert(node.name, e.to_string());
                        } else {
                            report.failures.push(ImportFailure {
                                package: node.name,
                                reason: e.to_string(),
                                retryable: e.is_retryable(),
                            });
                        }
                    }
                },
                Ok(UnitOutcome::NotScheduled) => {}
                Err(join_error) => {
                    tracing::error!("import worker panicked: {join_error}");
                }
            }
        }

        report.succeeded.sort_by(|a, b| a.name.cmp(&b.name));
        report.failures.sort_by(|a, b| a.package.cmp(&b.package));

        // A failed package's OS dependencies are not silently demanded:
        // only the succeeded subset contributes.
        report.osdeps_needed = selection.osdep_names().clone();
        for node in &report.succeeded {
            report.osdeps_needed.extend(self.engine.os_deps_of(node));
        }

        self.reporter.summary(
            report.succeeded.len(),
            report.failures.len(),
            started.elapsed().as_secs_f64(),
        );

        if cancel.is_cancelled() {
            return Err(ImportRunError::Interrupted { report });
        }
        if !report.failures.is_empty() {
            return Err(ImportRunError::Failures { report });
        }
        Ok(report)
    }

    /// Probe how every succeeded package's checkout relates to its
    /// remote. With `only_local`, importers answer from local state
    /// without touching the network.
    pub async fn statuses(
        &self,
        report: &ImportReport,
        only_local: bool,
    ) -> Result<BTreeMap<PackageName, StatusReport>, ImportError> {
        let mut statuses = BTreeMap::new();
        for node in &report.succeeded {
            let Some(importer) = self.importers.importer_for(node) else {
                continue;
            };
            statuses.insert(node.name.clone(), importer.status(only_local).await?);
        }
        Ok(statuses)
    }

    /// Collect VCS pinning descriptors for every succeeded package.
    pub async fn snapshot(
        &self,
        report: &ImportReport,
        opts: &SnapshotOptions,
    ) -> Result<BTreeMap<PackageName, BTreeMap<String, String>>, ImportError> {
        let mut pins = BTreeMap::new();
        for node in &report.succeeded {
            let Some(importer) = self.importers.importer_for(node) else {
                continue;
            };
            pins.insert(node.name.clone(), importer.snapshot(opts).await?);
        }
        Ok(pins)
    }
}

/// One import unit: status probe, then fetch or update, with immediate
/// retries for transient failures.
async fn import_one<R: Reporter>(
    node: &PackageNode,
    importer: &dyn Importer,
    opts: &ImportOptions,
    cancel: &CancellationToken,
    reporter: &R,
) -> Result<UnitDone, ImportError> {
    let present = importer.is_present().await;

    if present && opts.checkout_only {
        return Ok(UnitDone::Skipped("already checked out"));
    }

    let mut attempt: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }

        let result = if present {
            reporter.updating(&node.name);
            let update_opts = UpdateOptions {
                checkout_only: opts.checkout_only,
                only_local: opts.only_local,
                reset: opts.reset,
            };
            importer.update(&update_opts).await.map(|_| UnitDone::Updated)
        } else if opts.only_local {
            Err(ImportError::LocalOnly)
        } else {
            reporter.fetching(&node.name);
            importer.fetch().await.map(|()| UnitDone::Imported)
        };

        match result {
            Ok(done) => return Ok(done),
            Err(e) if e.is_retryable() && attempt < opts.retry_count => {
                attempt += 1;
                tracing::debug!(
                    package = %node.name,
                    attempt,
                    "retrying after transient failure: {e}"
                );
            }
            Err(e) => return Err(e),
        }
    }
}
