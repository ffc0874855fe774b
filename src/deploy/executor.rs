use crate::deploy::report::{DeploymentReport, UnitReport, UnitStatus};
use crate::deploy::{ApplyOutcome, ClusterApply};
use crate::graph::{DeploymentGraph, GraphState};
use crate::group::UnitPayload;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// What happens to units unrelated to a failed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Skip only the failed unit's dependents.
    #[default]
    ContinueIndependent,
    /// Skip every unit not yet submitted.
    Abort,
}

/// Submits a deployment graph unit by unit in dependency order.
///
/// A unit is submitted only after every predecessor reported success. There
/// is no retry and no rollback: units applied before a failure stay applied,
/// and re-running the deployment is safe because apply is idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deployer {
    policy: FailurePolicy,
}

impl Deployer {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    /// Consume `graph` and apply each unit through `cluster`.
    pub fn submit<C: ClusterApply + ?Sized>(
        &self,
        mut graph: DeploymentGraph,
        cluster: &mut C,
    ) -> DeploymentReport {
        let mut lifecycle = vec![graph.state()];
        graph.mark_submitted();
        lifecycle.push(graph.state());
        info!(units = graph.len(), policy = ?self.policy, "deployment graph submitted");

        let mut succeeded = BTreeSet::<&str>::new();
        let mut first_failure: Option<&str> = None;
        let mut units = Vec::with_capacity(graph.len());

        for unit in graph.order() {
            let predecessors = graph.predecessors(&unit.name);
            let report = |status| UnitReport {
                name: unit.name.clone(),
                predecessors: predecessors.iter().map(|p| p.to_string()).collect(),
                status,
            };

            if let (FailurePolicy::Abort, Some(failed)) = (self.policy, first_failure) {
                warn!(unit = %unit.name, failed, "skipping unit: deployment aborted");
                units.push(report(UnitStatus::Skipped {
                    blocked_by: failed.to_string(),
                    aborted: true,
                }));
                continue;
            }

            if let Some(blocked) = predecessors.iter().find(|p| !succeeded.contains(*p)) {
                warn!(unit = %unit.name, blocked_by = %blocked, "skipping unit: predecessor did not succeed");
                units.push(report(UnitStatus::Skipped {
                    blocked_by: blocked.to_string(),
                    aborted: false,
                }));
                continue;
            }

            let result = match &unit.payload {
                UnitPayload::Manifests(docs) if docs.is_empty() => {
                    debug!(unit = %unit.name, "empty unit, nothing to apply");
                    Ok(ApplyOutcome::default())
                }
                UnitPayload::Manifests(docs) => {
                    info!(unit = %unit.name, documents = docs.len(), "applying manifests");
                    cluster.apply_manifests(&unit.name, docs, &predecessors)
                }
                UnitPayload::Chart(release) => {
                    info!(unit = %unit.name, release = %release.release, chart = %release.chart, "applying chart");
                    cluster.apply_chart(&unit.name, release, &predecessors)
                }
            };

            match result {
                Ok(outcome) => {
                    info!(unit = %unit.name, changed = outcome.changed, "unit succeeded");
                    succeeded.insert(unit.name.as_str());
                    units.push(report(UnitStatus::Succeeded {
                        changed: outcome.changed,
                    }));
                }
                Err(err) => {
                    let dependents = graph.dependents(&unit.name);
                    warn!(
                        unit = %unit.name,
                        error = %err,
                        dependents = dependents.len(),
                        "unit failed; dependents will be skipped"
                    );
                    first_failure.get_or_insert(unit.name.as_str());
                    units.push(report(UnitStatus::Failed { cause: err.cause }));
                }
            }
        }

        let state = match (first_failure, self.policy) {
            (None, _) => GraphState::Succeeded,
            (Some(_), FailurePolicy::ContinueIndependent) => GraphState::PartiallyFailed,
            (Some(_), FailurePolicy::Abort) => GraphState::Aborted,
        };
        graph.finish(state);
        lifecycle.push(graph.state());
        info!(state = %state, "deployment finished");

        DeploymentReport {
            state,
            lifecycle,
            units,
        }
    }
}
