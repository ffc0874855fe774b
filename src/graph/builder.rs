use crate::error::GraphError;
use crate::graph::topology::{DeploymentGraph, GraphState, topological_order};
use crate::group::Unit;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static UNIT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("unit name pattern")
});

/// Collects units and `(predecessor, dependent)` edges before validation.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    units: Vec<Unit>,
    edges: Vec<(String, String)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    /// Declare that `dependent` must not start before `predecessor` succeeded.
    pub fn add_edge(&mut self, predecessor: impl Into<String>, dependent: impl Into<String>) {
        self.edges.push((predecessor.into(), dependent.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Validate the graph and build it:
    /// - at least one unit, names well-formed and unique
    /// - edges reference existing units
    /// - no self-loop, no duplicate edge
    /// - cycle detection (acyclic)
    pub fn build(self) -> Result<DeploymentGraph, GraphError> {
        // 1) Units.
        if self.units.is_empty() {
            return Err(GraphError::Empty);
        }
        let mut index = BTreeMap::<String, usize>::new();
        for (i, unit) in self.units.iter().enumerate() {
            if !UNIT_NAME_RE.is_match(&unit.name) {
                return Err(GraphError::InvalidName(unit.name.clone()));
            }
            if index.insert(unit.name.clone(), i).is_some() {
                return Err(GraphError::DuplicateUnit(unit.name.clone()));
            }
        }

        // 2) Edges.
        let n = self.units.len();
        let mut predecessors = vec![Vec::<usize>::new(); n];
        let mut successors = vec![Vec::<usize>::new(); n];
        let mut seen = BTreeSet::<(usize, usize)>::new();
        for (pred, dep) in &self.edges {
            let Some(&d) = index.get(dep) else {
                return Err(GraphError::UnknownDependent {
                    predecessor: pred.clone(),
                    unit: dep.clone(),
                });
            };
            let Some(&p) = index.get(pred) else {
                return Err(GraphError::UnknownPredecessor {
                    unit: dep.clone(),
                    predecessor: pred.clone(),
                });
            };
            if p == d {
                return Err(GraphError::SelfLoop(dep.clone()));
            }
            if !seen.insert((p, d)) {
                return Err(GraphError::DuplicateEdge {
                    predecessor: pred.clone(),
                    dependent: dep.clone(),
                });
            }
            predecessors[d].push(p);
            successors[p].push(d);
        }

        // 3) Cycle detection (DFS coloring), starting from every unit in
        // declaration order so pure cycles without a root are found too.
        let mut marks = vec![None::<Mark>; n];
        let mut stack = Vec::new();
        for v in 0..n {
            stack.clear();
            if let Err(cycle) = dfs(v, &successors, &mut marks, &mut stack) {
                let names = cycle
                    .into_iter()
                    .map(|i| self.units[i].name.clone())
                    .collect();
                return Err(GraphError::Cycle(names));
            }
        }

        let order = topological_order(&predecessors, &successors);

        Ok(DeploymentGraph {
            units: self.units,
            index,
            predecessors,
            successors,
            order,
            state: GraphState::Built,
        })
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Temp,
    Perm,
}

/// Returns the cycle path (first node repeated at the end) on failure.
fn dfs(
    v: usize,
    successors: &[Vec<usize>],
    marks: &mut [Option<Mark>],
    stack: &mut Vec<usize>,
) -> Result<(), Vec<usize>> {
    match marks[v] {
        Some(Mark::Perm) => return Ok(()),
        Some(Mark::Temp) => {
            // v is on the current path => cycle
            let start = stack.iter().position(|&s| s == v).unwrap_or(0);
            let mut cycle = stack[start..].to_vec();
            cycle.push(v);
            return Err(cycle);
        }
        None => {}
    }

    marks[v] = Some(Mark::Temp);
    stack.push(v);

    for &k in &successors[v] {
        dfs(k, successors, marks, stack)?;
    }

    stack.pop();
    marks[v] = Some(Mark::Perm);
    Ok(())
}
