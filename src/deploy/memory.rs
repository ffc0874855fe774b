//! In-memory cluster used for dry runs.
//!
//! Objects are keyed by document identity and releases by namespace + name;
//! re-applying identical content changes nothing.

use crate::deploy::{ApplyOutcome, ClusterApply};
use crate::error::ApplyError;
use crate::manifest::{Document, DocumentId};
use crate::spec::ChartRelease;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct MemoryCluster {
    objects: BTreeMap<DocumentId, String>,
    releases: BTreeMap<(String, String), String>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn release_count(&self) -> usize {
        self.releases.len()
    }
}

impl ClusterApply for MemoryCluster {
    fn apply_manifests(
        &mut self,
        unit: &str,
        documents: &[Document],
        predecessors: &[&str],
    ) -> Result<ApplyOutcome, ApplyError> {
        debug!(unit, ?predecessors, "memory apply");
        let mut changed = 0;
        for doc in documents {
            let body = doc.canonical();
            if self.objects.get(&doc.id) != Some(&body) {
                self.objects.insert(doc.id.clone(), body);
                changed += 1;
            }
        }
        Ok(ApplyOutcome { changed })
    }

    fn apply_chart(
        &mut self,
        unit: &str,
        release: &ChartRelease,
        predecessors: &[&str],
    ) -> Result<ApplyOutcome, ApplyError> {
        debug!(unit, ?predecessors, release = %release.release, "memory chart install");
        let body = serde_json::to_string(release).map_err(|e| ApplyError::new(unit, e.to_string()))?;
        let key = (release.namespace.clone(), release.release.clone());
        if self.releases.get(&key) == Some(&body) {
            return Ok(ApplyOutcome { changed: 0 });
        }
        self.releases.insert(key, body);
        Ok(ApplyOutcome { changed: 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::Deployer;
    use crate::graph::{DeploymentGraph, GraphBuilder};
    use crate::group::Unit;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn graph(replicas: u32) -> DeploymentGraph {
        let ns = Document::from_value(
            "ns.yaml",
            0,
            json!({ "apiVersion": "v1", "kind": "Namespace", "metadata": { "name": "demo" } }),
        )
        .unwrap();
        let app = Document::from_value(
            "demo-v1.yaml",
            0,
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": { "name": "demo-v1", "namespace": "demo" },
                "spec": { "replicas": replicas }
            }),
        )
        .unwrap();
        let release: ChartRelease = serde_yaml::from_str(
            "release: istio-base\nchart: base\nrepository: https://charts\nnamespace: istio-system\n",
        )
        .unwrap();

        let mut b = GraphBuilder::new();
        b.add_unit(Unit::manifests("namespace", vec![ns]));
        b.add_unit(Unit::manifests("app", vec![app]));
        b.add_unit(Unit::chart("mesh-base", release));
        b.add_edge("namespace", "app");
        b.build().unwrap()
    }

    #[test]
    fn rerun_against_matching_cluster_changes_nothing() {
        let mut cluster = MemoryCluster::new();

        let first = Deployer::default().submit(graph(1), &mut cluster);
        assert!(first.is_success());
        assert_eq!(first.changed(), 3);

        let second = Deployer::default().submit(graph(1), &mut cluster);
        assert!(second.is_success());
        assert_eq!(second.changed(), 0);
        assert_eq!(cluster.object_count(), 2);
        assert_eq!(cluster.release_count(), 1);
    }

    #[test]
    fn modified_document_counts_as_change() {
        let mut cluster = MemoryCluster::new();
        Deployer::default().submit(graph(1), &mut cluster);

        let report = Deployer::default().submit(graph(2), &mut cluster);
        assert_eq!(report.changed(), 1);
        assert_eq!(cluster.object_count(), 2);
    }

    #[test]
    fn gateways_from_different_api_groups_coexist() {
        let gateway = |api_version: &str| {
            Document::from_value(
                "gw.yaml",
                0,
                json!({
                    "apiVersion": api_version,
                    "kind": "Gateway",
                    "metadata": { "name": "demo", "namespace": "demo" }
                }),
            )
            .unwrap()
        };
        let mut cluster = MemoryCluster::new();

        let docs = [
            gateway("networking.istio.io/v1beta1"),
            gateway("gateway.networking.k8s.io/v1"),
        ];
        let outcome = cluster.apply_manifests("gateways", &docs, &[]).unwrap();

        assert_eq!(outcome.changed, 2);
        assert_eq!(cluster.object_count(), 2);
    }
}
