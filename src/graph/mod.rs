//! Dependency graph over workspace packages.
//!
//! The graph is derived from declared dependency names, rebuilt per
//! invocation, and read-only afterwards. Edges point from a package to
//! its dependency; names that do not resolve inside the workspace are
//! dropped (external dependencies are assumed already satisfied).

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::core::workspace::Workspace;

/// Error computing a build order.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("cyclic dependency among packages: {}", members.join(" -> "))]
    CyclicDependency { members: Vec<String> },
}

/// The dependency graph of a workspace.
#[derive(Debug)]
pub struct DepGraph {
    /// Package graph, edge package -> dependency.
    graph: DiGraph<String, ()>,

    /// Map from package name to node index.
    nodes: HashMap<String, NodeIndex>,
}

impl DepGraph {
    /// Build the graph from a workspace snapshot.
    pub fn build(ws: &Workspace) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for package in ws.packages() {
            let node = graph.add_node(package.name().to_string());
            nodes.insert(package.name().to_string(), node);
        }

        for package in ws.packages() {
            let from = nodes[package.name()];
            for dep in package.depends() {
                match nodes.get(dep.as_str()) {
                    Some(&to) => {
                        if !graph.contains_edge(from, to) {
                            graph.add_edge(from, to, ());
                        }
                    }
                    None => {
                        tracing::debug!(
                            "ignoring dependency `{}` of `{}`: not a workspace package",
                            dep,
                            package.name()
                        );
                    }
                }
            }
        }

        DepGraph { graph, nodes }
    }

    /// Get the direct in-workspace dependencies of a package.
    pub fn deps(&self, name: &str) -> Vec<String> {
        match self.nodes.get(name) {
            Some(&node) => self
                .graph
                .neighbors(node)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Get the packages that directly depend on the given package.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        match self.nodes.get(name) {
            Some(&node) => self
                .graph
                .neighbors_directed(node, petgraph::Direction::Incoming)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Expand a set of names with the transitive closure of dependencies.
    ///
    /// When `include_deps` is false the input is returned unchanged. The
    /// result is always a superset of the input, closed under the
    /// dependency relation, and idempotent.
    pub fn expand<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        include_deps: bool,
    ) -> BTreeSet<String> {
        let mut result: BTreeSet<String> = names.into_iter().map(str::to_string).collect();
        if !include_deps {
            return result;
        }

        let mut stack: Vec<String> = result.iter().cloned().collect();
        while let Some(current) = stack.pop() {
            for dep in self.deps(&current) {
                if result.insert(dep.clone()) {
                    stack.push(dep);
                }
            }
        }

        result
    }

    /// Compute a deterministic topological order over the given names.
    ///
    /// Dependencies precede dependents; ties break by package name so
    /// the order is reproducible across runs. Fails with
    /// [`GraphError::CyclicDependency`] if the induced subgraph has a
    /// cycle, without returning any partial order.
    pub fn topo_order(&self, names: &BTreeSet<String>) -> Result<Vec<String>, GraphError> {
        // Remaining unbuilt in-workspace dependency count per package,
        // restricted to the induced subgraph.
        let mut pending: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for name in names {
            let deps: Vec<String> = self
                .deps(name)
                .into_iter()
                .filter(|d| names.contains(d))
                .collect();
            pending.insert(name.as_str(), deps.len());
            for dep in deps {
                let dep = names.get(&dep).expect("dep is in the induced set");
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&name, _)| name)
            .collect();

        let mut order = Vec::with_capacity(names.len());
        while let Some(&name) = ready.iter().next() {
            ready.remove(name);
            order.push(name.to_string());
            for &dependent in dependents.get(name).map(Vec::as_slice).unwrap_or(&[]) {
                let count = pending
                    .get_mut(dependent)
                    .expect("dependent is in the induced set");
                *count -= 1;
                if *count == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < names.len() {
            return Err(GraphError::CyclicDependency {
                members: self.cycle_members(names),
            });
        }

        Ok(order)
    }

    /// Collect the members of dependency cycles within the given names.
    fn cycle_members(&self, names: &BTreeSet<String>) -> Vec<String> {
        let mut induced = DiGraph::<&str, ()>::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        for name in names {
            index.insert(name.as_str(), induced.add_node(name.as_str()));
        }
        for name in names {
            for dep in self.deps(name) {
                if let Some(&to) = index.get(dep.as_str()) {
                    induced.add_edge(index[name.as_str()], to, ());
                }
            }
        }

        let mut members: Vec<String> = tarjan_scc(&induced)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .flatten()
            .map(|node| induced[node].to_string())
            .collect();
        members.sort();
        members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_workspace;
    use tempfile::TempDir;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_edges_only_for_workspace_packages() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(tmp.path(), &[("a", &["system_lib", "b"]), ("b", &[])]);

        let graph = DepGraph::build(&ws);
        assert_eq!(graph.deps("a"), vec!["b".to_string()]);
        assert_eq!(graph.dependents("b"), vec!["a".to_string()]);
    }

    #[test]
    fn test_expand_transitive_closure() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(
            tmp.path(),
            &[("a", &[]), ("b", &["a"]), ("c", &["b"]), ("d", &[])],
        );
        let graph = DepGraph::build(&ws);

        let expanded = graph.expand(["c"], true);
        assert_eq!(expanded, names(&["a", "b", "c"]));

        // Superset of the input and idempotent.
        let again = graph.expand(expanded.iter().map(String::as_str), true);
        assert_eq!(again, expanded);
    }

    #[test]
    fn test_expand_without_deps_is_identity() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(tmp.path(), &[("a", &[]), ("b", &["a"])]);
        let graph = DepGraph::build(&ws);

        assert_eq!(graph.expand(["b"], false), names(&["b"]));
    }

    #[test]
    fn test_topo_order_dependencies_first() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(
            tmp.path(),
            &[("app", &["lib", "util"]), ("lib", &["util"]), ("util", &[])],
        );
        let graph = DepGraph::build(&ws);

        let order = graph
            .topo_order(&names(&["app", "lib", "util"]))
            .unwrap();
        assert_eq!(order, vec!["util", "lib", "app"]);
    }

    #[test]
    fn test_topo_order_ties_break_by_name() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(
            tmp.path(),
            &[("zeta", &[]), ("alpha", &[]), ("mid", &["alpha", "zeta"])],
        );
        let graph = DepGraph::build(&ws);

        let order = graph
            .topo_order(&names(&["zeta", "alpha", "mid"]))
            .unwrap();
        assert_eq!(order, vec!["alpha", "zeta", "mid"]);
    }

    #[test]
    fn test_topo_order_each_package_once() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(
            tmp.path(),
            &[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])],
        );
        let graph = DepGraph::build(&ws);

        let requested = names(&["a", "b", "c"]);
        let order = graph.topo_order(&requested).unwrap();
        assert_eq!(order.len(), requested.len());
        for name in &requested {
            assert_eq!(order.iter().filter(|n| *n == name).count(), 1);
        }
    }

    #[test]
    fn test_topo_order_detects_cycle() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(
            tmp.path(),
            &[("a", &["b"]), ("b", &["c"]), ("c", &["a"]), ("free", &[])],
        );
        let graph = DepGraph::build(&ws);

        let err = graph
            .topo_order(&names(&["a", "b", "c", "free"]))
            .unwrap_err();
        let GraphError::CyclicDependency { members } = err;
        assert_eq!(members, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_topo_order_cycle_outside_selection_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(
            tmp.path(),
            &[("a", &["b"]), ("b", &["a"]), ("free", &[])],
        );
        let graph = DepGraph::build(&ws);

        // The cycle between a and b does not affect an order that only
        // requests `free`.
        let order = graph.topo_order(&names(&["free"])).unwrap();
        assert_eq!(order, vec!["free"]);
    }
}
