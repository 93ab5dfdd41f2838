//! Typed handles for OS package managers.
//!
//! Manager names appearing in osdep specs (`"os"`, `"pip"`, `"gem"`, ...)
//! are resolved once, at startup, into `Arc<dyn PackageManager>` handles
//! through a registry. Nothing downstream dispatches on the name string
//! again.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::osdeps::entry::{ManagerOutcome, ManagerResult};
use crate::osdeps::resolver::ResolveError;

/// An OS package manager the workspace can install through.
///
/// Implemented by collaborators that wrap the actual manager binaries;
/// the core never shells out itself.
pub trait PackageManager: Send + Sync {
    /// The name this manager is registered under.
    fn name(&self) -> &str;

    /// Install the given concrete packages. With `install_only`, packages
    /// that are already present must not be upgraded.
    fn install(&self, names: &[String], install_only: bool) -> anyhow::Result<()>;

    /// Filter out packages that are already up to date. Managers that
    /// cannot tell return the input unchanged.
    fn filter_uptodate(&self, names: Vec<String>) -> Vec<String> {
        names
    }
}

impl std::fmt::Debug for dyn PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PackageManager({})", self.name())
    }
}

/// Registry mapping manager names to implementations.
#[derive(Debug, Default)]
pub struct ManagerRegistry {
    managers: BTreeMap<String, Arc<dyn PackageManager>>,
}

impl ManagerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manager under its own name, replacing any previous one.
    pub fn register(&mut self, manager: Arc<dyn PackageManager>) {
        self.managers.insert(manager.name().to_string(), manager);
    }

    /// Look up a manager by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn PackageManager>, ResolveError> {
        self.managers
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownManager {
                name: name.to_string(),
            })
    }

    /// Whether a manager is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.managers.contains_key(name)
    }

    /// Registered manager names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.managers.keys().map(String::as_str)
    }

    /// Resolve manager results into typed handles, dropping sentinel
    /// outcomes (they have nothing to install). Fails on the first
    /// manager name with no registered implementation.
    pub fn handles_for(
        &self,
        results: &[ManagerResult],
    ) -> Result<Vec<(Arc<dyn PackageManager>, Vec<String>)>, ResolveError> {
        let mut handles = Vec::new();
        for result in results {
            if result.outcome != ManagerOutcome::Available || result.names.is_empty() {
                continue;
            }
            handles.push((self.get(&result.manager)?, result.names.clone()));
        }
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullManager(&'static str);

    impl PackageManager for NullManager {
        fn name(&self) -> &str {
            self.0
        }

        fn install(&self, _names: &[String], _install_only: bool) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lookup_resolves_once_into_typed_handles() {
        let mut registry = ManagerRegistry::new();
        registry.register(Arc::new(NullManager("os")));
        registry.register(Arc::new(NullManager("pip")));

        let results = vec![
            ManagerResult::available("os", vec!["libfoo-dev".into()]),
            ManagerResult::sentinel("os", ManagerOutcome::Ignore),
            ManagerResult::available("pip", vec!["foo".into()]),
        ];

        let handles = registry.handles_for(&results).unwrap();
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].0.name(), "os");
        assert_eq!(handles[0].1, vec!["libfoo-dev"]);
        assert_eq!(handles[1].0.name(), "pip");
    }

    #[test]
    fn test_unknown_manager_is_an_error() {
        let registry = ManagerRegistry::new();
        let results = vec![ManagerResult::available("gem", vec!["rake".into()])];
        assert_eq!(
            registry.handles_for(&results).unwrap_err(),
            ResolveError::UnknownManager {
                name: "gem".to_string()
            }
        );
    }
}
