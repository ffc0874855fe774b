use crate::graph::GraphState;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum UnitStatus {
    Succeeded {
        changed: usize,
    },
    Failed {
        cause: String,
    },
    /// Never submitted. `blocked_by` is the predecessor that did not succeed,
    /// or the failed unit that aborted the run.
    Skipped {
        blocked_by: String,
        aborted: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub name: String,
    pub predecessors: Vec<String>,
    #[serde(flatten)]
    pub status: UnitStatus,
}

/// Outcome of one submitted graph, units in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    /// Terminal state of the graph.
    pub state: GraphState,
    /// Every state the graph passed through, ending with `state`.
    pub lifecycle: Vec<GraphState>,
    pub units: Vec<UnitReport>,
}

impl DeploymentReport {
    pub fn is_success(&self) -> bool {
        self.state == GraphState::Succeeded
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.names(|s| matches!(s, UnitStatus::Succeeded { .. }))
    }

    pub fn failed(&self) -> Vec<&str> {
        self.names(|s| matches!(s, UnitStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.names(|s| matches!(s, UnitStatus::Skipped { .. }))
    }

    /// Total objects changed across succeeded units.
    pub fn changed(&self) -> usize {
        self.units
            .iter()
            .map(|u| match u.status {
                UnitStatus::Succeeded { changed } => changed,
                _ => 0,
            })
            .sum()
    }

    pub fn status(&self, unit: &str) -> Option<&UnitStatus> {
        self.units.iter().find(|u| u.name == unit).map(|u| &u.status)
    }

    fn names(&self, pred: impl Fn(&UnitStatus) -> bool) -> Vec<&str> {
        self.units
            .iter()
            .filter(|u| pred(&u.status))
            .map(|u| u.name.as_str())
            .collect()
    }
}
