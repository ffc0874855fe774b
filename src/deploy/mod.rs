//! Dependency-ordered submission of a deployment graph to a cluster.
//!
//! The cluster itself is an external collaborator behind `ClusterApply`.
//! Implementations must make re-applying identical content a no-op.

pub mod executor;
pub mod kubectl;
pub mod memory;
pub mod report;

use crate::error::ApplyError;
use crate::manifest::Document;
use crate::spec::ChartRelease;

pub use executor::{Deployer, FailurePolicy};
pub use kubectl::KubectlCluster;
pub use memory::MemoryCluster;
pub use report::{DeploymentReport, UnitReport, UnitStatus};

/// Result of one successful apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Objects created or modified; zero when the cluster already matched.
    pub changed: usize,
}

/// Apply collaborator: mutates live cluster or package state.
pub trait ClusterApply {
    /// Apply `documents` as one batch. `predecessors` names the units that
    /// already succeeded and that this batch was ordered after.
    fn apply_manifests(
        &mut self,
        unit: &str,
        documents: &[Document],
        predecessors: &[&str],
    ) -> Result<ApplyOutcome, ApplyError>;

    /// Install or upgrade a packaged component release.
    fn apply_chart(
        &mut self,
        unit: &str,
        release: &ChartRelease,
        predecessors: &[&str],
    ) -> Result<ApplyOutcome, ApplyError>;
}
