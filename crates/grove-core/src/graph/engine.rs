//! Selection and transitive closure over the dependency graph.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use thiserror::Error;

use crate::graph::{DependencyGraph, PackageNode, PackageSelection, SourceOsPrecedence};
use crate::osdeps::{Availability, OsDepResolver};
use crate::types::{OsIdentity, PackageName};

/// Errors raised while resolving a user selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// A required name is neither a source package nor an osdep.
    #[error("cannot resolve '{name}': it is neither a source package nor an osdep on this OS")]
    PackageNotFound {
        /// The unresolvable name.
        name: String,
    },

    /// A selected name, directly or transitively, is excluded.
    #[error("package '{name}' is excluded from the build: {reason} (selected by way of {})", chain.join(" -> "))]
    Excluded {
        /// The excluded package.
        name: String,
        /// The human-readable exclusion reason.
        reason: String,
        /// Provenance path from a user-selected root to the package.
        chain: Vec<String>,
    },

    /// An osdep in the selection has no definition at all.
    #[error("osdep '{name}' has no package-manager entry on any OS")]
    MissingOsDep {
        /// The undefined osdep.
        name: String,
    },
}

/// Outcome of [`SelectionEngine::select`]: the resolved selection plus
/// the input strings that matched nothing. Unmatched strings are not an
/// error so the caller can attempt directory-based auto-registration and
/// re-resolve.
#[derive(Debug, Clone)]
pub struct Selected {
    /// The resolved selection.
    pub selection: PackageSelection,
    /// Input strings that matched nothing.
    pub unresolved: Vec<String>,
}

/// Expands user-supplied names into the full set of source packages and
/// OS packages that must exist.
///
/// Pure with respect to shared state: graph, resolver and OS identity
/// are borrowed immutably, so an engine can be used from any number of
/// readers at once.
#[derive(Debug, Clone, Copy)]
pub struct SelectionEngine<'a> {
    graph: &'a DependencyGraph,
    resolver: &'a OsDepResolver,
    identity: &'a OsIdentity,
}

/// Internal result of the closure walk.
struct Expansion {
    nodes: Vec<PackageNode>,
    osdeps: BTreeSet<String>,
    parents: BTreeMap<String, String>,
}

enum NameMatch {
    Source(PackageName),
    OsDep(String),
    Paths(Vec<PackageName>),
    None,
}

impl<'a> SelectionEngine<'a> {
    /// Create an engine over a loaded graph and resolver.
    pub fn new(
        graph: &'a DependencyGraph,
        resolver: &'a OsDepResolver,
        identity: &'a OsIdentity,
    ) -> Self {
        Self {
            graph,
            resolver,
            identity,
        }
    }

    /// Resolve user-supplied names into a selection.
    ///
    /// Each name is matched, in order, against the exact source-package
    /// names, the exact osdep names, and finally as a path prefix of
    /// known source directories. With `recursive`, the selection also
    /// includes the transitive dependency closure, with provenance
    /// recorded per package.
    pub fn select(&self, names: &[String], recursive: bool) -> Result<Selected, SelectError> {
        self.select_weak(names, recursive, &BTreeSet::new())
    }

    /// Like [`select`], with some origin tokens marked weak: a weak name
    /// matching nothing, or matching only excluded packages, is dropped
    /// instead of raising an error.
    ///
    /// [`select`]: Self::select
    pub fn select_weak(
        &self,
        names: &[String],
        recursive: bool,
        weak: &BTreeSet<String>,
    ) -> Result<Selected, SelectError> {
        let mut selection = PackageSelection::new();
        for origin in weak {
            selection.mark_weak(origin);
        }
        let mut unresolved = Vec::new();

        for raw in names {
            let is_weak = weak.contains(raw);
            match self.match_name(raw) {
                NameMatch::Source(name) => {
                    if let Some(reason) = self.graph.exclusion_reason(&name) {
                        if is_weak {
                            tracing::debug!("weak selection '{raw}' is excluded, dropping");
                            continue;
                        }
                        return Err(SelectError::Excluded {
                            name: name.to_string(),
                            reason: reason.to_string(),
                            chain: vec![name.to_string()],
                        });
                    }
                    selection.add_source(name, raw);
                }
                NameMatch::OsDep(name) => selection.add_osdep(name, raw),
                NameMatch::Paths(matched) => {
                    for name in matched {
                        if self.graph.exclusion_reason(&name).is_some() {
                            // Directory selections sweep up whole trees;
                            // excluded packages under them are skipped,
                            // not errors.
                            continue;
                        }
                        selection.add_source(name, raw);
                    }
                }
                NameMatch::None => unresolved.push(raw.clone()),
            }
        }

        if recursive {
            let expansion = self.expand(&selection)?;
            let mut expanded = selection.clone();
            for node in &expansion.nodes {
                match expansion.parents.get(node.name.as_str()) {
                    Some(parent) => expanded.add_source(node.name.clone(), parent),
                    None => {
                        if !expanded.source_names().contains(&node.name) {
                            expanded.add_source(node.name.clone(), node.name.as_str());
                        }
                    }
                }
            }
            for osdep in &expansion.osdeps {
                if !expanded.osdep_names().contains(osdep) {
                    if let Some(parent) = expansion.parents.get(osdep.as_str()) {
                        expanded.add_osdep(osdep.clone(), parent);
                    }
                }
            }
            selection = expanded;
        }

        Ok(Selected {
            selection,
            unresolved,
        })
    }

    /// The transitive closure of source packages a selection needs, in
    /// name order. Cycles terminate through the visited set; running the
    /// closure over its own output yields the same set.
    pub fn all_selected_source_packages(
        &self,
        selection: &PackageSelection,
    ) -> Result<Vec<PackageNode>, SelectError> {
        let mut expansion = self.expand(selection)?;
        expansion.nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(expansion.nodes)
    }

    /// The union of every osdep declared by the closure, plus the
    /// explicitly selected ones. Fails if any osdep has no definition.
    pub fn all_selected_os_packages(
        &self,
        selection: &PackageSelection,
    ) -> Result<BTreeSet<String>, SelectError> {
        let expansion = self.expand(selection)?;
        for name in &expansion.osdeps {
            if self.resolver.availability(name, self.identity) == Availability::NoPackage {
                return Err(SelectError::MissingOsDep { name: name.clone() });
            }
        }
        Ok(expansion.osdeps)
    }

    /// The osdeps one package contributes: its declared osdeps plus any
    /// direct dependency that decides to the OS side.
    pub fn os_deps_of(&self, node: &PackageNode) -> BTreeSet<String> {
        let mut osdeps = node.os_deps.clone();
        for dep in node.deps.iter().chain(node.optional_deps.iter()) {
            if self.decides_to_osdep(dep) {
                osdeps.insert(dep.to_string());
            }
        }
        osdeps
    }

    /// Decide a name present as both source and OS package. Pure
    /// function of the graph's override table, the resolver and the OS
    /// identity.
    pub fn decides_to_osdep(&self, name: &str) -> bool {
        let in_graph = self.graph.node(name).is_some();
        let in_osdeps = self.resolver.contains(name);
        match (in_graph, in_osdeps) {
            (false, true) => true,
            (true, true) => match self.graph.precedence(name) {
                SourceOsPrecedence::ForceSource => false,
                SourceOsPrecedence::ForceOs => true,
                SourceOsPrecedence::PreferOs => {
                    self.resolver.availability(name, self.identity) == Availability::Available
                }
            },
            _ => false,
        }
    }

    fn match_name(&self, raw: &str) -> NameMatch {
        let in_graph = self.graph.node(raw).is_some() || self.graph.exclusion_reason(raw).is_some();
        if in_graph || self.resolver.contains(raw) {
            if self.decides_to_osdep(raw) {
                return NameMatch::OsDep(raw.to_string());
            }
            if in_graph {
                return NameMatch::Source(PackageName::new(raw));
            }
            return NameMatch::OsDep(raw.to_string());
        }

        let as_path = Path::new(raw);
        let matched: Vec<PackageName> = self
            .graph
            .nodes_under(as_path)
            .into_iter()
            .map(|n| n.name.clone())
            .collect();
        if matched.is_empty() {
            NameMatch::None
        } else {
            NameMatch::Paths(matched)
        }
    }

    fn expand(&self, selection: &PackageSelection) -> Result<Expansion, SelectError> {
        let mut visited: BTreeSet<PackageName> = BTreeSet::new();
        let mut parents: BTreeMap<String, String> = BTreeMap::new();
        let mut nodes: Vec<PackageNode> = Vec::new();
        let mut osdeps: BTreeSet<String> = selection.osdep_names().clone();

        // Walk the strong roots first and fully. An excluded package
        // reachable from any non-weak root must error, even when a weak
        // root happens to share it; only packages reachable from weak
        // roots alone get the silent skip.
        let mut strong: VecDeque<(PackageName, bool)> = VecDeque::new();
        let mut weak: VecDeque<(PackageName, bool)> = VecDeque::new();
        for name in selection.source_names() {
            if self.weak_rooted(selection, name) {
                weak.push_back((name.clone(), true));
            } else {
                strong.push_back((name.clone(), true));
            }
        }

        self.walk(strong, false, selection, &mut visited, &mut parents, &mut nodes, &mut osdeps)?;
        self.walk(weak, true, selection, &mut visited, &mut parents, &mut nodes, &mut osdeps)?;

        Ok(Expansion {
            nodes,
            osdeps,
            parents,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        mut queue: VecDeque<(PackageName, bool)>,
        from_weak_roots: bool,
        selection: &PackageSelection,
        visited: &mut BTreeSet<PackageName>,
        parents: &mut BTreeMap<String, String>,
        nodes: &mut Vec<PackageNode>,
        osdeps: &mut BTreeSet<String>,
    ) -> Result<(), SelectError> {
        while let Some((name, required)) = queue.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }

            if let Some(reason) = self.graph.exclusion_reason(&name) {
                if !required || from_weak_roots {
                    tracing::debug!("skipping excluded package '{name}': {reason}");
                    continue;
                }
                return Err(SelectError::Excluded {
                    name: name.to_string(),
                    reason: reason.to_string(),
                    chain: chain_to(selection, parents, &name),
                });
            }

            let Some(node) = self.graph.node(&name) else {
                if !required {
                    tracing::debug!("optional dependency '{name}' is not defined, skipping");
                    continue;
                }
                return Err(SelectError::PackageNotFound {
                    name: name.to_string(),
                });
            };

            osdeps.extend(node.os_deps.iter().cloned());
            for dep in &node.deps {
                self.enqueue_dep(dep, &name, true, visited, &mut queue, parents, osdeps);
            }
            for dep in &node.optional_deps {
                self.enqueue_dep(dep, &name, false, visited, &mut queue, parents, osdeps);
            }
            nodes.push(node.clone());
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn enqueue_dep(
        &self,
        dep: &PackageName,
        parent: &PackageName,
        required: bool,
        visited: &BTreeSet<PackageName>,
        queue: &mut VecDeque<(PackageName, bool)>,
        parents: &mut BTreeMap<String, String>,
        osdeps: &mut BTreeSet<String>,
    ) {
        if visited.contains(dep) {
            return;
        }
        parents
            .entry(dep.to_string())
            .or_insert_with(|| parent.to_string());
        if self.decides_to_osdep(dep) {
            osdeps.insert(dep.to_string());
            return;
        }
        queue.push_back((dep.clone(), required));
    }

    /// Whether every user-level origin of the selection root `name` was
    /// marked weak.
    fn weak_rooted(&self, selection: &PackageSelection, name: &PackageName) -> bool {
        match selection.reasons(name) {
            Some(origins) => !origins.is_empty() && origins.iter().all(|o| selection.is_weak(o)),
            None => selection.is_weak(name),
        }
    }
}

fn chain_to(
    selection: &PackageSelection,
    parents: &BTreeMap<String, String>,
    name: &str,
) -> Vec<String> {
    let mut chain = vec![name.to_string()];
    let mut current = name.to_string();
    let mut hops = 0usize;
    while let Some(parent) = parents.get(&current) {
        chain.push(parent.clone());
        current = parent.clone();
        hops += 1;
        if hops > parents.len() {
            break;
        }
    }
    // Extend through the selection provenance to the user-given root.
    let mut head = selection.reason_chain(&current);
    head.pop();
    head.extend(chain.into_iter().rev());
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osdeps::{OsDepEntry, PackageSpec};

    fn identity() -> OsIdentity {
        OsIdentity::new(["ubuntu"], ["22.04"])
    }

    fn graph(nodes: Vec<PackageNode>) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for node in nodes {
            g.add_node(node);
        }
        g
    }

    fn osdeps(names: &[&str]) -> OsDepResolver {
        let mut r = OsDepResolver::new("test-set");
        for name in names {
            r.add_spec(PackageSpec::new(*name).with_os("ubuntu", OsDepEntry::name(format!("{name}-dev"))));
        }
        r
    }

    fn select_names(engine: &SelectionEngine<'_>, names: &[&str]) -> Selected {
        let names: Vec<String> = names.iter().map(ToString::to_string).collect();
        engine.select(&names, false).unwrap()
    }

    #[test]
    fn test_match_order_source_then_osdep_then_path() {
        let g = graph(vec![
            PackageNode::new("drivers/gps").with_srcdir("drivers/gps"),
            PackageNode::new("drivers/imu").with_srcdir("drivers/imu"),
        ]);
        let r = osdeps(&["libeigen"]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["drivers/gps", "libeigen", "drivers"]);
        assert!(
            selected
                .selection
                .source_names()
                .contains(&PackageName::new("drivers/gps"))
        );
        assert!(
            selected
                .selection
                .source_names()
                .contains(&PackageName::new("drivers/imu"))
        );
        assert!(selected.selection.osdep_names().contains("libeigen"));
        assert!(selected.unresolved.is_empty());
    }

    #[test]
    fn test_unmatched_names_are_returned_not_errors() {
        let g = graph(vec![PackageNode::new("core")]);
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["core", "no/such/thing"]);
        assert_eq!(selected.unresolved, vec!["no/such/thing"]);
    }

    #[test]
    fn test_os_package_wins_over_source_when_available() {
        let g = graph(vec![PackageNode::new("opencv")]);
        let r = osdeps(&["opencv"]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["opencv"]);
        assert!(selected.selection.source_names().is_empty());
        assert!(selected.selection.osdep_names().contains("opencv"));
    }

    #[test]
    fn test_source_fallback_when_os_package_unavailable() {
        let g = graph(vec![PackageNode::new("opencv")]);
        // Spec exists, but only for macos: not available here.
        let mut r = OsDepResolver::new("test-set");
        r.add_spec(PackageSpec::new("opencv").with_os("macos", OsDepEntry::name("opencv")));
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["opencv"]);
        assert!(
            selected
                .selection
                .source_names()
                .contains(&PackageName::new("opencv"))
        );
    }

    #[test]
    fn test_precedence_overrides_both_ways() {
        let mut g = graph(vec![PackageNode::new("opencv"), PackageNode::new("yaml")]);
        g.set_precedence("opencv", SourceOsPrecedence::ForceSource);
        g.set_precedence("yaml", SourceOsPrecedence::ForceOs);
        let r = osdeps(&["opencv"]); // yaml has no spec at all
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["opencv", "yaml"]);
        assert!(
            selected
                .selection
                .source_names()
                .contains(&PackageName::new("opencv"))
        );
        // ForceOs only applies when the name is actually an osdep too.
        assert!(
            selected
                .selection
                .source_names()
                .contains(&PackageName::new("yaml"))
        );
    }

    #[test]
    fn test_closure_is_cycle_safe_and_idempotent() {
        // a -> b -> c -> a
        let g = graph(vec![
            PackageNode::new("a").with_deps(["b"]),
            PackageNode::new("b").with_deps(["c"]),
            PackageNode::new("c").with_deps(["a"]).with_os_deps(["libz"]),
        ]);
        let r = osdeps(&["libz"]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["a"]);
        let closure = engine
            .all_selected_source_packages(&selected.selection)
            .unwrap();
        let names: Vec<&str> = closure.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        // Closure of the closure is the closure.
        let mut re_selection = PackageSelection::new();
        for node in &closure {
            re_selection.add_source(node.name.clone(), node.name.as_str());
        }
        let again = engine.all_selected_source_packages(&re_selection).unwrap();
        let again_names: Vec<&str> = again.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, again_names);
    }

    #[test]
    fn test_os_packages_are_union_over_closure_plus_explicit() {
        let g = graph(vec![
            PackageNode::new("a").with_deps(["b"]).with_os_deps(["liba"]),
            PackageNode::new("b").with_os_deps(["libb"]),
        ]);
        let r = osdeps(&["liba", "libb", "extra"]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["a", "extra"]);
        let os_packages = engine
            .all_selected_os_packages(&selected.selection)
            .unwrap();
        let expected: BTreeSet<String> = ["liba", "libb", "extra"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(os_packages, expected);
    }

    #[test]
    fn test_missing_osdep_definition_is_an_error() {
        let g = graph(vec![PackageNode::new("a").with_os_deps(["ghost"])]);
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["a"]);
        let err = engine
            .all_selected_os_packages(&selected.selection)
            .unwrap_err();
        assert_eq!(
            err,
            SelectError::MissingOsDep {
                name: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_transitive_exclusion_surfaces_reason_and_chain() {
        let mut g = graph(vec![
            PackageNode::new("A").with_deps(["M"]),
            PackageNode::new("M").with_deps(["B"]),
            PackageNode::new("B"),
        ]);
        g.exclude("B", "does not build on this OS");
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["A"]);
        let err = engine
            .all_selected_source_packages(&selected.selection)
            .unwrap_err();
        let SelectError::Excluded {
            name,
            reason,
            chain,
        } = err
        else {
            panic!("expected an exclusion error");
        };
        assert_eq!(name, "B");
        assert_eq!(reason, "does not build on this OS");
        assert_eq!(chain, vec!["A", "M", "B"]);
    }

    #[test]
    fn test_direct_selection_of_excluded_package_fails() {
        let mut g = graph(vec![PackageNode::new("broken")]);
        g.exclude("broken", "removed by the workspace config");
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let err = engine
            .select(&["broken".to_string()], false)
            .unwrap_err();
        assert!(matches!(err, SelectError::Excluded { .. }));
        assert!(err.to_string().contains("removed by the workspace config"));
    }

    #[test]
    fn test_weak_selection_of_excluded_package_is_dropped() {
        let mut g = graph(vec![PackageNode::new("broken"), PackageNode::new("fine")]);
        g.exclude("broken", "known bad");
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let weak: BTreeSet<String> = ["broken".to_string()].into();
        let selected = engine
            .select_weak(&["broken".to_string(), "fine".to_string()], false, &weak)
            .unwrap();
        assert!(
            !selected
                .selection
                .source_names()
                .contains(&PackageName::new("broken"))
        );
        assert!(
            selected
                .selection
                .source_names()
                .contains(&PackageName::new("fine"))
        );
    }

    #[test]
    fn test_excluded_dep_shared_with_weak_root_still_errors() {
        // "a_viz" sorts before "z_core", so the weak root is seen first;
        // the shared exclusion must still surface for the strong root.
        let mut g = graph(vec![
            PackageNode::new("a_viz").with_deps(["shared"]),
            PackageNode::new("z_core").with_deps(["shared"]),
            PackageNode::new("shared"),
        ]);
        g.exclude("shared", "does not build on this OS");
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let weak: BTreeSet<String> = ["a_viz".to_string()].into();
        let selected = engine
            .select_weak(&["a_viz".to_string(), "z_core".to_string()], false, &weak)
            .unwrap();
        let err = engine
            .all_selected_source_packages(&selected.selection)
            .unwrap_err();
        let SelectError::Excluded { name, chain, .. } = err else {
            panic!("expected an exclusion error");
        };
        assert_eq!(name, "shared");
        assert_eq!(chain, vec!["z_core", "shared"]);
    }

    #[test]
    fn test_excluded_dep_under_weak_root_only_is_skipped() {
        let mut g = graph(vec![
            PackageNode::new("viz").with_deps(["shared"]),
            PackageNode::new("shared"),
        ]);
        g.exclude("shared", "known bad");
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let weak: BTreeSet<String> = ["viz".to_string()].into();
        let selected = engine
            .select_weak(&["viz".to_string()], false, &weak)
            .unwrap();
        let closure = engine
            .all_selected_source_packages(&selected.selection)
            .unwrap();
        let names: Vec<&str> = closure.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["viz"]);
    }

    #[test]
    fn test_optional_dependencies_are_followed_but_not_required() {
        let g = graph(vec![
            PackageNode::new("viz").with_optional(["gui", "not_defined"]),
            PackageNode::new("gui"),
        ]);
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["viz"]);
        let closure = engine
            .all_selected_source_packages(&selected.selection)
            .unwrap();
        let names: Vec<&str> = closure.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["gui", "viz"]);
    }

    #[test]
    fn test_required_missing_dependency_is_an_error() {
        let g = graph(vec![PackageNode::new("a").with_deps(["gone"])]);
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["a"]);
        let err = engine
            .all_selected_source_packages(&selected.selection)
            .unwrap_err();
        assert_eq!(
            err,
            SelectError::PackageNotFound {
                name: "gone".to_string()
            }
        );
    }

    #[test]
    fn test_recursive_select_records_provenance() {
        let g = graph(vec![
            PackageNode::new("control").with_deps(["base/cmake"]),
            PackageNode::new("base/cmake"),
        ]);
        let r = osdeps(&[]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = engine.select(&["control".to_string()], true).unwrap();
        assert!(
            selected
                .selection
                .source_names()
                .contains(&PackageName::new("base/cmake"))
        );
        assert_eq!(
            selected.selection.reason_chain("base/cmake"),
            vec!["control", "base/cmake"]
        );
    }

    #[test]
    fn test_dependency_satisfied_by_os_package() {
        let g = graph(vec![PackageNode::new("app").with_deps(["opencv"])]);
        let r = osdeps(&["opencv"]);
        let id = identity();
        let engine = SelectionEngine::new(&g, &r, &id);

        let selected = select_names(&engine, &["app"]);
        let closure = engine
            .all_selected_source_packages(&selected.selection)
            .unwrap();
        assert_eq!(closure.len(), 1);
        let os_packages = engine
            .all_selected_os_packages(&selected.selection)
            .unwrap();
        assert!(os_packages.contains("opencv"));
    }
}
