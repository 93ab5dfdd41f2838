//! Pure resolution of abstract osdep names to package-manager entries.
//!
//! Resolution is hierarchical: the first matching OS-name candidate wins,
//! and within it the first matching OS-version candidate, falling back to
//! the `"default"` version key and finally to a plain non-versioned
//! entry. Global entries are always appended to whatever matched, so an
//! OS-specific entry can never remove the global baseline.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::osdeps::entry::{
    Availability, DEFAULT_KEY, DEFAULT_MANAGER, ManagerOutcome, ManagerResult, OsDepEntry,
    PackageSpec,
};
use crate::types::OsIdentity;

/// Prefix marking a concrete name as a reference to another osdep spec.
pub const OSDEP_REF_PREFIX: &str = "osdep:";

/// Errors raised while resolving an osdep spec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A recursive entry points at a name with no spec.
    #[error("osdep '{name}' references '{referenced}', which has no osdep definition")]
    InvalidRecursiveReference {
        /// The spec containing the reference.
        name: String,
        /// The name the reference points at.
        referenced: String,
    },

    /// A spec is structurally unusable.
    #[error("invalid osdep definition for '{name}': {reason}")]
    Config {
        /// The offending spec.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A manager name has no registered implementation.
    #[error("no package manager registered under '{name}'")]
    UnknownManager {
        /// The unregistered manager name.
        name: String,
    },
}

/// A definition conflict found while merging two resolvers.
///
/// Carries both raw specs so callers can show them side by side; the
/// merge keeps the second resolver's definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeWarning {
    /// The redefined osdep name.
    pub name: String,
    /// Origin label of the resolver being merged into.
    pub left_origin: String,
    /// Origin label of the resolver being merged in.
    pub right_origin: String,
    /// The definition that is being replaced.
    pub left: PackageSpec,
    /// The definition that wins.
    pub right: PackageSpec,
}

impl std::fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "osdep '{}' is defined by both {} and {}:\n  {}: {:?}\n  {}: {:?}\nkeeping the definition from {}",
            self.name,
            self.left_origin,
            self.right_origin,
            self.left_origin,
            self.left,
            self.right_origin,
            self.right,
            self.right_origin
        )
    }
}

/// Maps abstract package names to concrete package-manager entries,
/// parameterized by an explicit [`OsIdentity`].
#[derive(Debug, Clone, Default)]
pub struct OsDepResolver {
    specs: BTreeMap<String, PackageSpec>,
    aliases: BTreeMap<String, String>,
    origin: String,
    prefer_indirect: bool,
}

impl OsDepResolver {
    /// Create an empty resolver. `origin` labels this resolver in merge
    /// diagnostics (typically the package set it was loaded from).
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Prefer `"default"`-keyed (manager-specific) entries over
    /// OS-name-specific ones. Used when a workspace prefers language-level
    /// package managers over native OS packages. Affects the OS-name axis
    /// only, never manager-internal ordering.
    pub fn with_prefer_indirect(mut self, prefer: bool) -> Self {
        self.prefer_indirect = prefer;
        self
    }

    /// The origin label used in merge diagnostics.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Register a spec, replacing any previous definition of the name.
    pub fn add_spec(&mut self, spec: PackageSpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    /// Register `alias` as another name for `canonical`. Alias lookup
    /// happens before spec lookup and is invisible to everything else.
    pub fn add_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Whether a spec (possibly through an alias) exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(self.canonical_name(name))
    }

    /// The spec registered for `name`, following aliases.
    pub fn lookup(&self, name: &str) -> Option<&PackageSpec> {
        self.specs.get(self.canonical_name(name))
    }

    /// All known osdep names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    /// Resolve `name` for the given OS, following `osdep:` references
    /// one hop.
    ///
    /// A missing spec resolves to no results; use [`availability`] to
    /// classify why. A reference to a missing spec is an error, as is a
    /// reference nested more than one level deep.
    ///
    /// [`availability`]: Self::availability
    pub fn resolve(
        &self,
        name: &str,
        identity: &OsIdentity,
    ) -> Result<Vec<ManagerResult>, ResolveError> {
        let raw = self.resolve_raw(name, identity);
        self.follow_references(name, identity, raw)
    }

    /// Resolve `name` without following `osdep:` references, leaving
    /// them as literal names (used by display paths and by merging).
    pub fn resolve_raw(&self, name: &str, identity: &OsIdentity) -> Vec<ManagerResult> {
        match self.lookup(name) {
            Some(spec) => self.resolve_spec(spec, identity),
            None => Vec::new(),
        }
    }

    /// Aggregate resolvability of `name` for the given OS.
    ///
    /// Classifies the reference-followed results, so a sentinel behind
    /// an `osdep:` reference counts. A spec whose reference cannot be
    /// followed is classified from its raw entries; the broken
    /// reference itself surfaces when [`resolve`] is called.
    ///
    /// [`resolve`]: Self::resolve
    pub fn availability(&self, name: &str, identity: &OsIdentity) -> Availability {
        let Some(spec) = self.lookup(name) else {
            return Availability::NoPackage;
        };
        let raw = self.resolve_spec(spec, identity);
        let results = match self.follow_references(name, identity, raw.clone()) {
            Ok(followed) => followed,
            Err(_) => raw,
        };
        if results.is_empty() {
            return if identity.is_known() {
                Availability::WrongOs
            } else {
                Availability::UnknownOs
            };
        }
        if results
            .iter()
            .any(|r| r.outcome == ManagerOutcome::Nonexistent)
        {
            return Availability::Nonexistent;
        }
        if results.iter().all(|r| r.names.is_empty()) {
            return Availability::Ignore;
        }
        Availability::Available
    }

    /// Merge `other` into `self`. For every name defined by both with
    /// differing raw specs, emits one warning naming both origins;
    /// `other`'s definition wins. Raw specs are compared, never resolved
    /// forms, so merging can never trip a recursion error.
    pub fn merge(&mut self, other: OsDepResolver) -> Vec<MergeWarning> {
        let mut warnings = Vec::new();
        for (name, spec) in other.specs {
            if let Some(existing) = self.specs.get(&name) {
                if *existing != spec {
                    let warning = MergeWarning {
                        name: name.clone(),
                        left_origin: self.origin.clone(),
                        right_origin: other.origin.clone(),
                        left: existing.clone(),
                        right: spec.clone(),
                    };
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
            self.specs.insert(name, spec);
        }
        for (alias, canonical) in other.aliases {
            self.aliases.insert(alias, canonical);
        }
        warnings
    }

    fn resolve_spec(&self, spec: &PackageSpec, identity: &OsIdentity) -> Vec<ManagerResult> {
        let mut results = Vec::new();

        let mut candidates: Vec<&str> = Vec::new();
        if self.prefer_indirect {
            candidates.push(DEFAULT_KEY);
        }
        candidates.extend(identity.names().iter().map(String::as_str));
        if !self.prefer_indirect {
            candidates.push(DEFAULT_KEY);
        }

        for os_name in candidates {
            if let Some(entry) = spec.os_entries.get(os_name) {
                self.collect(spec, entry, DEFAULT_MANAGER, identity, &mut results);
                break;
            }
        }

        for entry in &spec.global_entries {
            self.collect(spec, entry, DEFAULT_MANAGER, identity, &mut results);
        }

        coalesce(results)
    }

    fn collect(
        &self,
        spec: &PackageSpec,
        entry: &OsDepEntry,
        manager: &str,
        identity: &OsIdentity,
        out: &mut Vec<ManagerResult>,
    ) {
        match entry {
            OsDepEntry::Empty => {
                out.push(ManagerResult::available(manager, vec![spec.name.clone()]));
            }
            OsDepEntry::Name(n) => out.push(ManagerResult::available(manager, vec![n.clone()])),
            OsDepEntry::List(ns) => out.push(ManagerResult::available(manager, ns.clone())),
            OsDepEntry::Ignore => {
                out.push(ManagerResult::sentinel(manager, ManagerOutcome::Ignore));
            }
            OsDepEntry::Nonexistent => out.push(ManagerResult::sentinel(
                manager,
                ManagerOutcome::Nonexistent,
            )),
            OsDepEntry::ManagerMap(map) => {
                for (mgr, sub) in map {
                    self.collect(spec, sub, mgr, identity, out);
                }
            }
            OsDepEntry::VersionMap(map) => {
                // First matching version wins and suppresses the default
                // fallback for this axis.
                let matched = identity
                    .versions()
                    .iter()
                    .find_map(|v| map.get(v.as_str()))
                    .or_else(|| map.get(DEFAULT_KEY));
                if let Some(sub) = matched {
                    self.collect(spec, sub, manager, identity, out);
                }
            }
        }
    }

    fn follow_references(
        &self,
        name: &str,
        identity: &OsIdentity,
        results: Vec<ManagerResult>,
    ) -> Result<Vec<ManagerResult>, ResolveError> {
        let mut expanded = Vec::new();
        for result in results {
            let mut kept = Vec::new();
            for concrete in result.names {
                let Some(referenced) = concrete.strip_prefix(OSDEP_REF_PREFIX) else {
                    kept.push(concrete);
                    continue;
                };
                if !self.contains(referenced) {
                    return Err(ResolveError::InvalidRecursiveReference {
                        name: name.to_string(),
                        referenced: referenced.to_string(),
                    });
                }
                // One hop only: anything the referenced spec resolves to
                // must be concrete.
                for sub in self.resolve_raw(referenced, identity) {
                    if let Some(nested) = sub.names.iter().find(|n| n.starts_with(OSDEP_REF_PREFIX))
                    {
                        return Err(ResolveError::Config {
                            name: referenced.to_string(),
                            reason: format!(
                                "reference '{nested}' is nested more than one level deep"
                            ),
                        });
                    }
                    expanded.push(sub);
                }
            }
            if !kept.is_empty() || result.outcome != ManagerOutcome::Available {
                expanded.push(ManagerResult {
                    manager: result.manager,
                    outcome: result.outcome,
                    names: kept,
                });
            }
        }
        Ok(coalesce(expanded))
    }
}

/// Groups results per manager, preserving first-seen manager order.
/// Within one manager, `nonexistent` dominates, then any concrete names,
/// then `ignore`.
fn coalesce(results: Vec<ManagerResult>) -> Vec<ManagerResult> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: BTreeMap<String, ManagerResult> = BTreeMap::new();

    for result in results {
        match merged.get_mut(&result.manager) {
            None => {
                order.push(result.manager.clone());
                merged.insert(result.manager.clone(), result);
            }
            Some(existing) => {
                for n in result.names {
                    if !existing.names.contains(&n) {
                        existing.names.push(n);
                    }
                }
                if result.outcome == ManagerOutcome::Nonexistent {
                    existing.outcome = ManagerOutcome::Nonexistent;
                    existing.names.clear();
                } else if existing.outcome != ManagerOutcome::Nonexistent
                    && !existing.names.is_empty()
                {
                    existing.outcome = ManagerOutcome::Available;
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|manager| merged.remove(&manager))
        .collect()
}
