//! The in-memory graph of source packages and user selections over it.
//!
//! The graph is built by the manifest loader (an external collaborator)
//! and is read-only for the rest of a resolution/import pass: the
//! selection engine and the import orchestrator only ever look things up.

pub mod engine;

pub use engine::{Selected, SelectError, SelectionEngine};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::types::PackageName;

/// One source package known to the workspace.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackageNode {
    /// The package name.
    pub name: PackageName,
    /// Direct dependencies, in declaration order.
    pub deps: Vec<PackageName>,
    /// Optional dependencies: used when present, skipped when not.
    pub optional_deps: BTreeSet<PackageName>,
    /// Abstract osdep names this package needs.
    pub os_deps: BTreeSet<String>,
    /// Source checkout directory, when known.
    pub srcdir: Option<PathBuf>,
}

impl PackageNode {
    /// Create a node with no dependencies.
    pub fn new(name: impl Into<PackageName>) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            optional_deps: BTreeSet::new(),
            os_deps: BTreeSet::new(),
            srcdir: None,
        }
    }

    /// Add direct dependencies.
    pub fn with_deps<S: Into<PackageName>>(mut self, deps: impl IntoIterator<Item = S>) -> Self {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Add optional dependencies.
    pub fn with_optional<S: Into<PackageName>>(
        mut self,
        deps: impl IntoIterator<Item = S>,
    ) -> Self {
        self.optional_deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Add osdep names.
    pub fn with_os_deps<S: Into<String>>(mut self, deps: impl IntoIterator<Item = S>) -> Self {
        self.os_deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Set the source directory.
    pub fn with_srcdir(mut self, srcdir: impl Into<PathBuf>) -> Self {
        self.srcdir = Some(srcdir.into());
        self
    }
}

/// How a name that exists as both a source package and an OS package is
/// decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOsPrecedence {
    /// The OS package wins when the resolver reports it available;
    /// otherwise fall back to the source package. The default.
    PreferOs,
    /// The source package wins regardless of OS availability.
    ForceSource,
    /// The OS package wins regardless of OS availability.
    ForceOs,
}

/// All source packages the manifest declared, plus exclusions and
/// source-vs-OS precedence overrides.
///
/// Mutated only while the manifest loads; immutable for the rest of the
/// pass.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<PackageName, PackageNode>,
    excluded: BTreeMap<PackageName, String>,
    overrides: BTreeMap<String, SourceOsPrecedence>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package, replacing any previous node of the same name.
    pub fn add_node(&mut self, node: PackageNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    /// Mark a package as excluded with a human-readable reason. Any
    /// attempt to select it, directly or transitively, surfaces the
    /// reason.
    pub fn exclude(&mut self, name: impl Into<PackageName>, reason: impl Into<String>) {
        self.excluded.insert(name.into(), reason.into());
    }

    /// Force how a name present as both source and OS package is decided.
    pub fn set_precedence(&mut self, name: impl Into<String>, precedence: SourceOsPrecedence) {
        self.overrides.insert(name.into(), precedence);
    }

    /// Look up a package node.
    pub fn node(&self, name: &str) -> Option<&PackageNode> {
        self.nodes.get(&PackageName::new(name))
    }

    /// Why a package is excluded, if it is.
    pub fn exclusion_reason(&self, name: &str) -> Option<&str> {
        self.excluded.get(&PackageName::new(name)).map(String::as_str)
    }

    /// The precedence configured for `name` (defaults to [`PreferOs`]).
    ///
    /// [`PreferOs`]: SourceOsPrecedence::PreferOs
    pub fn precedence(&self, name: &str) -> SourceOsPrecedence {
        self.overrides
            .get(name)
            .copied()
            .unwrap_or(SourceOsPrecedence::PreferOs)
    }

    /// All known package names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &PackageName> {
        self.nodes.keys()
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no packages.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Packages whose source directory lives under `prefix`.
    pub fn nodes_under(&self, prefix: &Path) -> Vec<&PackageNode> {
        self.nodes
            .values()
            .filter(|n| n.srcdir.as_ref().is_some_and(|d| d.starts_with(prefix)))
            .collect()
    }
}

/// What a user asked for, fully resolved: source packages, osdeps and
/// the provenance of why each name is present.
///
/// Built once per invocation and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSelection {
    source_names: BTreeSet<PackageName>,
    osdep_names: BTreeSet<String>,
    selection_reason: BTreeMap<String, BTreeSet<String>>,
    weak: BTreeSet<String>,
}

impl PackageSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source package, recording `origin` as the reason.
    pub fn add_source(&mut self, name: impl Into<PackageName>, origin: &str) {
        let name = name.into();
        self.record_reason(name.as_str(), origin);
        self.source_names.insert(name);
    }

    /// Add an osdep, recording `origin` as the reason.
    pub fn add_osdep(&mut self, name: impl Into<String>, origin: &str) {
        let name = name.into();
        self.record_reason(&name, origin);
        self.osdep_names.insert(name);
    }

    /// Mark an origin token as weak: its failure to match anything, or
    /// matching only excluded packages, is not a user error.
    pub fn mark_weak(&mut self, origin: impl Into<String>) {
        self.weak.insert(origin.into());
    }

    /// Selected source package names.
    pub fn source_names(&self) -> &BTreeSet<PackageName> {
        &self.source_names
    }

    /// Explicitly selected osdep names.
    pub fn osdep_names(&self) -> &BTreeSet<String> {
        &self.osdep_names
    }

    /// Why `name` is in the selection, if it is.
    pub fn reasons(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.selection_reason.get(name)
    }

    /// Whether `origin` was marked weak.
    pub fn is_weak(&self, origin: &str) -> bool {
        self.weak.contains(origin)
    }

    /// Whether nothing at all was selected.
    pub fn is_empty(&self) -> bool {
        self.source_names.is_empty() && self.osdep_names.is_empty()
    }

    /// The provenance path from a user-given root to `name`, e.g.
    /// `["control", "base/cmake", "cmake"]` for "cmake was selected by
    /// way of control -> base/cmake".
    pub fn reason_chain(&self, name: &str) -> Vec<String> {
        let mut chain = vec![name.to_string()];
        let mut seen: BTreeSet<String> = chain.iter().cloned().collect();
        let mut current = name.to_string();
        while let Some(origins) = self.selection_reason.get(&current) {
            let Some(origin) = origins.iter().find(|o| !seen.contains(*o)) else {
                break;
            };
            chain.push(origin.clone());
            seen.insert(origin.clone());
            current = origin.clone();
        }
        chain.reverse();
        chain
    }

    fn record_reason(&mut self, name: &str, origin: &str) {
        if name != origin {
            self.selection_reason
                .entry(name.to_string())
                .or_default()
                .insert(origin.to_string());
        }
    }
}
