use crate::group::Unit;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Lifecycle of a deployment graph once built.
///
/// `Built -> Submitted -> {Succeeded | PartiallyFailed | Aborted}`. Submission
/// is one-way: a new run builds a fresh graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphState {
    Built,
    Submitted,
    Succeeded,
    PartiallyFailed,
    Aborted,
}

impl GraphState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GraphState::Succeeded | GraphState::PartiallyFailed | GraphState::Aborted
        )
    }
}

impl fmt::Display for GraphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GraphState::Built => "built",
            GraphState::Submitted => "submitted",
            GraphState::Succeeded => "succeeded",
            GraphState::PartiallyFailed => "partially-failed",
            GraphState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Validated, acyclic set of units and predecessor edges.
#[derive(Debug)]
pub struct DeploymentGraph {
    pub(super) units: Vec<Unit>,
    pub(super) index: BTreeMap<String, usize>,
    pub(super) predecessors: Vec<Vec<usize>>,
    pub(super) successors: Vec<Vec<usize>>,
    /// Topological order, ties broken by declaration order.
    pub(super) order: Vec<usize>,
    pub(super) state: GraphState,
}

impl DeploymentGraph {
    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    /// Units in an order that respects every edge.
    pub fn order(&self) -> impl Iterator<Item = &Unit> {
        self.order.iter().map(|&i| &self.units[i])
    }

    /// Direct predecessors of `name`, in edge declaration order.
    pub fn predecessors(&self, name: &str) -> Vec<&str> {
        match self.index.get(name) {
            Some(&i) => self.predecessors[i]
                .iter()
                .map(|&p| self.units[p].name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every unit that transitively depends on `name`.
    pub fn dependents(&self, name: &str) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        let Some(&start) = self.index.get(name) else {
            return out;
        };

        let mut queue = vec![start];
        while let Some(v) = queue.pop() {
            for &k in &self.successors[v] {
                if out.insert(self.units[k].name.as_str()) {
                    queue.push(k);
                }
            }
        }
        out
    }

    pub(crate) fn mark_submitted(&mut self) {
        debug_assert_eq!(self.state, GraphState::Built);
        self.state = GraphState::Submitted;
    }

    /// Move a submitted graph to its terminal state.
    pub(crate) fn finish(&mut self, state: GraphState) {
        debug_assert_eq!(self.state, GraphState::Submitted);
        debug_assert!(state.is_terminal());
        self.state = state;
    }
}

/// Kahn's algorithm; the ready set is ordered by declaration index so the
/// result is deterministic. Assumes the graph is acyclic.
pub(super) fn topological_order(predecessors: &[Vec<usize>], successors: &[Vec<usize>]) -> Vec<usize> {
    let mut indegree: Vec<usize> = predecessors.iter().map(Vec::len).collect();
    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(predecessors.len());
    while let Some(v) = ready.pop_first() {
        order.push(v);
        for &k in &successors[v] {
            indegree[k] -= 1;
            if indegree[k] == 0 {
                ready.insert(k);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use crate::graph::GraphBuilder;
    use crate::group::Unit;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    /// The mesh demo layout.
    fn mesh_graph() -> super::DeploymentGraph {
        let mut b = GraphBuilder::new();
        for name in [
            "demo-routing",
            "demo-v2",
            "demo-v1",
            "ingress-gateway",
            "mesh-control-plane",
            "mesh-base",
            "demo-namespace",
            "mesh-namespace",
        ] {
            b.add_unit(Unit::manifests(name, vec![]));
        }
        b.add_edge("mesh-namespace", "mesh-base");
        b.add_edge("mesh-base", "mesh-control-plane");
        b.add_edge("mesh-control-plane", "ingress-gateway");
        b.add_edge("demo-namespace", "demo-v1");
        b.add_edge("demo-namespace", "demo-v2");
        b.add_edge("demo-v1", "demo-routing");
        b.add_edge("demo-v2", "demo-routing");
        b.add_edge("ingress-gateway", "demo-routing");
        b.build().unwrap()
    }

    #[test]
    fn order_respects_every_edge() {
        let graph = mesh_graph();
        let order: Vec<&str> = graph.order().map(|u| u.name.as_str()).collect();
        assert_eq!(order.len(), 8);

        let pos = |n: &str| order.iter().position(|o| *o == n).unwrap();
        for unit in graph.order() {
            for pred in graph.predecessors(&unit.name) {
                assert!(pos(pred) < pos(&unit.name), "{} before {}", pred, unit.name);
            }
        }
    }

    #[test]
    fn order_is_deterministic_by_declaration() {
        let graph = mesh_graph();
        let order: Vec<&str> = graph.order().map(|u| u.name.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "demo-namespace",
                "demo-v2",
                "demo-v1",
                "mesh-namespace",
                "mesh-base",
                "mesh-control-plane",
                "ingress-gateway",
                "demo-routing",
            ]
        );
    }

    #[test]
    fn dependents_are_transitive() {
        let graph = mesh_graph();
        assert_eq!(
            graph.dependents("mesh-base"),
            BTreeSet::from(["mesh-control-plane", "ingress-gateway", "demo-routing"])
        );
        assert!(graph.dependents("demo-routing").is_empty());
        assert!(graph.dependents("nope").is_empty());
    }

    #[test]
    fn predecessors_in_declaration_order() {
        let graph = mesh_graph();
        assert_eq!(
            graph.predecessors("demo-routing"),
            vec!["demo-v1", "demo-v2", "ingress-gateway"]
        );
        assert!(graph.predecessors("mesh-namespace").is_empty());
        assert!(graph.unit("demo-v1").is_some());
    }
}
