//! The osdep spec grammar as a closed set of variants.
//!
//! A manifest can put a bare name, a list of names, a per-version map, a
//! per-manager map or one of two sentinel keywords at the same grammar
//! position. Modelling that as one enum keeps every consumer exhaustive:
//! adding a variant breaks compilation everywhere it matters instead of
//! surfacing as a runtime type check.

use std::collections::BTreeMap;

/// Name of the implicit package manager used for entries that do not
/// name one themselves (the OS-native manager: apt, pacman, brew, ...).
pub const DEFAULT_MANAGER: &str = "os";

/// Reserved fallback key, on both the OS-name and OS-version axes.
pub const DEFAULT_KEY: &str = "default";

/// One entry in an osdep spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsDepEntry {
    /// No value at all. Resolves to the spec's own name on the default
    /// manager (declaring an osdep with no body means "the OS package
    /// is called the same thing").
    Empty,
    /// A single concrete package name.
    Name(String),
    /// Several concrete package names.
    List(Vec<String>),
    /// OS-version -> entry, with a reserved [`DEFAULT_KEY`] key.
    VersionMap(BTreeMap<String, OsDepEntry>),
    /// Package-manager name -> entry.
    ManagerMap(BTreeMap<String, OsDepEntry>),
    /// Resolved: present, zero packages needed.
    Ignore,
    /// Resolved: this package provably does not exist here.
    Nonexistent,
}

impl OsDepEntry {
    /// Build a version map from `(version, entry)` pairs.
    pub fn version_map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, OsDepEntry)>) -> Self {
        Self::VersionMap(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a manager map from `(manager, entry)` pairs.
    pub fn manager_map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, OsDepEntry)>) -> Self {
        Self::ManagerMap(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list entry from names.
    pub fn list<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::List(names.into_iter().map(Into::into).collect())
    }

    /// Build a single-name entry.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

/// One abstract osdep definition: hierarchical per-OS entries plus
/// global entries that always apply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageSpec {
    /// The abstract name this spec resolves.
    pub name: String,
    /// OS name -> entry. The reserved key `"default"` holds
    /// manager-specific entries that apply on any OS.
    pub os_entries: BTreeMap<String, OsDepEntry>,
    /// Entries declared outside any OS key. Always appended to whatever
    /// OS-specific entries matched; never part of the override decision.
    pub global_entries: Vec<OsDepEntry>,
}

impl PackageSpec {
    /// Create an empty spec for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an entry under an OS name.
    pub fn with_os(mut self, os_name: impl Into<String>, entry: OsDepEntry) -> Self {
        self.os_entries.insert(os_name.into(), entry);
        self
    }

    /// Add a global entry.
    pub fn with_global(mut self, entry: OsDepEntry) -> Self {
        self.global_entries.push(entry);
        self
    }
}

/// Per-manager outcome class of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ManagerOutcome {
    /// Resolved to one or more concrete packages.
    Available,
    /// Resolved, zero packages needed.
    Ignore,
    /// Explicitly marked absent on this OS.
    Nonexistent,
}

/// What one package manager has to install for an osdep.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManagerResult {
    /// Package-manager name ([`DEFAULT_MANAGER`] for unkeyed entries).
    pub manager: String,
    /// Outcome class for this manager.
    pub outcome: ManagerOutcome,
    /// Concrete package names (empty for the sentinel outcomes).
    pub names: Vec<String>,
}

impl ManagerResult {
    pub(crate) fn available(manager: &str, names: Vec<String>) -> Self {
        Self {
            manager: manager.to_string(),
            outcome: ManagerOutcome::Available,
            names,
        }
    }

    pub(crate) fn sentinel(manager: &str, outcome: ManagerOutcome) -> Self {
        Self {
            manager: manager.to_string(),
            outcome,
            names: Vec::new(),
        }
    }
}

/// Aggregate resolvability of an osdep, ordered from best to worst for
/// reporting purposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Availability {
    /// At least one manager resolved to concrete packages.
    Available,
    /// Every manager resolved to zero packages.
    Ignore,
    /// Some manager explicitly marked the package absent.
    Nonexistent,
    /// A spec exists but has no entry for the current OS.
    WrongOs,
    /// The machine's own OS identity could not be determined.
    UnknownOs,
    /// No spec at all.
    NoPackage,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Available => "available",
            Self::Ignore => "ignored",
            Self::Nonexistent => "nonexistent",
            Self::WrongOs => "no entry for this OS",
            Self::UnknownOs => "OS unknown",
            Self::NoPackage => "no osdep definition",
        };
        write!(f, "{s}")
    }
}
