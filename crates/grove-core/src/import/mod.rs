//! Parallel import of source packages through per-package [`Importer`]
//! capabilities.

pub mod importer;
pub mod orchestrator;

pub use importer::{
    ImportError, Importer, ResetMode, SnapshotOptions, StatusReport, SyncState, UpdateOptions,
};
pub use orchestrator::{
    ImportFailure, ImportOptions, ImportOrchestrator, ImportReport, ImportRunError,
    ImporterFactory,
};
