//! grove - workspace orchestration for multi-repository stacks
//!
//! Given a declarative manifest describing source packages, package sets
//! and per-OS dependency mappings, grove resolves which concrete
//! artifacts (source checkouts or OS packages) satisfy a user's
//! selection, and imports/updates them with bounded concurrency.
//!
//! # Architecture
//!
//! - **Explicit OS identity**: the machine's OS is an [`OsIdentity`]
//!   value passed into every resolve/select call, never process state.
//! - **Pure resolution**: [`OsDepResolver`] and [`SelectionEngine`] do
//!   no I/O and never mutate shared state; everything that can block
//!   lives behind the [`Importer`] capability.
//! - **Typed manager handles**: package-manager names are resolved once
//!   through a [`ManagerRegistry`] instead of re-dispatched by string.
//! - **Partitioned results**: an import run's failures never discard its
//!   successes; the [`ImportReport`] carries both.
//!
//! # Pipeline
//!
//! ```text
//! manifest load (external)
//!   -> DependencyGraph + OsDepResolver
//!   -> SelectionEngine: user names -> PackageSelection
//!   -> ImportOrchestrator: bounded concurrent fetch/update
//!   -> caller installs the reported OS packages and builds
//! ```
//!
//! [`OsIdentity`]: types::OsIdentity
//! [`OsDepResolver`]: osdeps::OsDepResolver
//! [`SelectionEngine`]: graph::SelectionEngine
//! [`Importer`]: import::Importer
//! [`ManagerRegistry`]: osdeps::ManagerRegistry
//! [`ImportReport`]: import::ImportReport

pub mod graph;
pub mod import;
pub mod manifest;
pub mod osdeps;
pub mod types;
pub mod ui;

// Re-exports for convenience
pub use graph::{DependencyGraph, PackageNode, PackageSelection, SelectionEngine};
pub use import::{ImportOptions, ImportOrchestrator, ImportReport, Importer};
pub use manifest::InstallationManifest;
pub use osdeps::{Availability, OsDepResolver, PackageSpec};
pub use types::{OsIdentity, PackageName};
