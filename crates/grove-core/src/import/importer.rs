//! The capability an import unit runs against.
//!
//! One `Importer` wraps one VCS kind (git, svn, archive, ...) for one
//! package. Implementations live outside the core; the orchestrator only
//! drives them. Any blocking the engine does happens inside these calls,
//! which is why they are async.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::manifest::VcsDescriptor;

/// How updates treat local state that differs from the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetMode {
    /// Never reset; diverged checkouts fail the update.
    #[default]
    None,
    /// Reset, but refuse to discard local commits the remote does not
    /// have (fails with [`ImportError::WouldDiscardCommits`]).
    Soft,
    /// Reset unconditionally.
    Force,
}

/// Options forwarded to [`Importer::update`].
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Skip updating packages that are already checked out.
    pub checkout_only: bool,
    /// Forbid network access; updates that need it must fail.
    pub only_local: bool,
    /// Reset policy for diverged checkouts.
    pub reset: ResetMode,
}

/// Options forwarded to [`Importer::snapshot`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotOptions {
    /// Pin from local state only, without asking the remote.
    pub only_local: bool,
}

/// Relationship between the local checkout and its remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SyncState {
    /// Local and remote point at the same thing.
    UpToDate,
    /// Local has commits the remote does not.
    Ahead,
    /// Remote has commits the local checkout does not.
    Behind,
    /// Both sides have commits the other lacks.
    Diverged,
}

/// Result of a status probe or an update.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatusReport {
    /// How local relates to remote.
    pub sync_state: SyncState,
    /// Commits only the local checkout has.
    pub local_commits: Vec<String>,
    /// Commits only the remote has.
    pub remote_commits: Vec<String>,
    /// Whether the working copy has uncommitted changes.
    pub uncommitted_changes: bool,
}

impl StatusReport {
    /// A clean, up-to-date status.
    pub fn up_to_date() -> Self {
        Self {
            sync_state: SyncState::UpToDate,
            local_commits: Vec::new(),
            remote_commits: Vec::new(),
            uncommitted_changes: false,
        }
    }
}

/// A single import unit's failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The importer failed. `retryable` marks transient failures
    /// (network hiccups) the orchestrator may retry.
    #[error("{reason}")]
    Failed {
        /// Human-readable failure reason.
        reason: String,
        /// Whether retrying the same call can plausibly succeed.
        retryable: bool,
    },

    /// The operation needs the network but the run is local-only.
    #[error("operation needs network access but the run is local-only")]
    LocalOnly,

    /// A soft reset would have discarded local commits.
    #[error("refusing to discard {count} local commit(s) the remote does not have")]
    WouldDiscardCommits {
        /// Number of local-only commits that would be lost.
        count: usize,
    },

    /// The unit was cancelled cooperatively.
    #[error("import cancelled")]
    Cancelled,
}

impl ImportError {
    /// A non-retryable failure with the given reason.
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            retryable: false,
        }
    }

    /// A retryable (transient) failure with the given reason.
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            retryable: true,
        }
    }

    /// Whether the orchestrator may retry the failed call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                retryable: true,
                ..
            }
        )
    }
}

/// Fetch/update/status/snapshot for one package under one VCS kind.
///
/// Instances are per package and never shared across workers. A hung
/// call is the implementation's problem to bound, not the
/// orchestrator's; cooperative cancellation likewise happens inside the
/// implementation.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Whether the package's sources are already present on disk.
    async fn is_present(&self) -> bool;

    /// Check out the package from scratch.
    async fn fetch(&self) -> Result<(), ImportError>;

    /// Bring an existing checkout up to date.
    async fn update(&self, opts: &UpdateOptions) -> Result<StatusReport, ImportError>;

    /// Probe how the checkout relates to its remote.
    async fn status(&self, only_local: bool) -> Result<StatusReport, ImportError>;

    /// VCS-specific pinning info (tag/commit/branch) for reproducing
    /// this checkout.
    async fn snapshot(&self, opts: &SnapshotOptions)
    -> Result<BTreeMap<String, String>, ImportError>;

    /// Point the checkout at a new upstream descriptor. Invoked by
    /// workspace-level flows when a package's VCS definition changes;
    /// the import engine itself never relocates.
    async fn relocate(&self, new_spec: &VcsDescriptor) -> Result<(), ImportError>;
}

impl std::fmt::Debug for dyn Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Importer")
    }
}
