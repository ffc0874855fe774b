//! End-to-end: plan file + manifest files -> graph -> ordered apply calls.

use mesh_deploy::deploy::{ApplyOutcome, ClusterApply, Deployer, MemoryCluster, UnitStatus};
use mesh_deploy::error::ApplyError;
use mesh_deploy::graph::GraphState;
use mesh_deploy::manifest::Document;
use mesh_deploy::pipeline::build_graph;
use mesh_deploy::spec::{ChartRelease, PlanSpec, ValidatedPlan};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

#[derive(Default)]
struct CallLog {
    calls: Vec<(String, Vec<String>)>,
    fail: Option<String>,
}

impl ClusterApply for CallLog {
    fn apply_manifests(
        &mut self,
        unit: &str,
        documents: &[Document],
        _predecessors: &[&str],
    ) -> Result<ApplyOutcome, ApplyError> {
        let ids = documents.iter().map(|d| d.id.to_string()).collect();
        self.calls.push((unit.to_string(), ids));
        if self.fail.as_deref() == Some(unit) {
            return Err(ApplyError::new(unit, "namespace quota exceeded"));
        }
        Ok(ApplyOutcome {
            changed: documents.len(),
        })
    }

    fn apply_chart(
        &mut self,
        unit: &str,
        release: &ChartRelease,
        _predecessors: &[&str],
    ) -> Result<ApplyOutcome, ApplyError> {
        self.calls.push((unit.to_string(), vec![release.release.clone()]));
        Ok(ApplyOutcome { changed: 1 })
    }
}

fn fixture(dir: &Path) -> ValidatedPlan {
    fs::write(
        dir.join("ns.yaml"),
        "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: demo\n---\n",
    )
    .unwrap();
    fs::write(
        dir.join("routes.yaml"),
        "\
apiVersion: networking.istio.io/v1beta1
kind: VirtualService
metadata: { name: demo, namespace: demo }
spec: { hosts: ['*'] }
---
apiVersion: networking.istio.io/v1beta1
kind: DestinationRule
metadata: { name: demo, namespace: demo }
spec: { host: demo }
",
    )
    .unwrap();
    fs::write(
        dir.join("deploy.yaml"),
        "\
units:
  - name: routing
    files: [routes.yaml]
    depends_on: [namespace]
  - name: namespace
    files: [ns.yaml]
",
    )
    .unwrap();

    PlanSpec::from_path(&dir.join("deploy.yaml"))
        .unwrap()
        .validate_and_build(dir)
        .unwrap()
}

#[test]
fn namespace_batch_is_applied_before_routing_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = fixture(tmp.path());

    let mut cluster = CallLog::default();
    let report = Deployer::default().submit(build_graph(&plan).unwrap(), &mut cluster);

    assert_eq!(
        cluster.calls,
        vec![
            ("namespace".to_string(), vec!["Namespace/demo".to_string()]),
            (
                "routing".to_string(),
                vec![
                    "VirtualService.networking.istio.io/demo/demo".to_string(),
                    "DestinationRule.networking.istio.io/demo/demo".to_string(),
                ]
            ),
        ]
    );
    assert_eq!(report.state, GraphState::Succeeded);
}

#[test]
fn failed_namespace_means_routing_is_never_applied() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = fixture(tmp.path());

    let mut cluster = CallLog {
        fail: Some("namespace".into()),
        ..CallLog::default()
    };
    let report = Deployer::new(plan.failure_policy).submit(build_graph(&plan).unwrap(), &mut cluster);

    assert_eq!(cluster.calls.len(), 1);
    assert_eq!(cluster.calls[0].0, "namespace");
    assert_eq!(report.failed(), vec!["namespace"]);
    assert_eq!(report.skipped(), vec!["routing"]);
    assert_eq!(
        report.status("namespace"),
        Some(&UnitStatus::Failed {
            cause: "namespace quota exceeded".into()
        })
    );
}

#[test]
fn redeploying_unchanged_sources_is_a_noop() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = fixture(tmp.path());
    let mut cluster = MemoryCluster::new();

    let first = Deployer::default().submit(build_graph(&plan).unwrap(), &mut cluster);
    let second = Deployer::default().submit(build_graph(&plan).unwrap(), &mut cluster);

    assert_eq!(first.changed(), 3);
    assert!(second.is_success());
    assert_eq!(second.changed(), 0);
}

#[test]
fn demo_plan_builds_and_orders_mesh_before_routing() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("demo");
    let plan = PlanSpec::from_path(&dir.join("deploy.yaml"))
        .unwrap()
        .validate_and_build(&dir)
        .unwrap();
    let graph = build_graph(&plan).unwrap();

    let order: Vec<String> = graph.order().map(|u| u.name.clone()).collect();
    let pos = |n: &str| order.iter().position(|o| o == n).unwrap();

    assert!(pos("mesh-namespace") < pos("mesh-base"));
    assert!(pos("mesh-base") < pos("mesh-control-plane"));
    assert!(pos("mesh-control-plane") < pos("ingress-gateway"));
    assert!(pos("demo-namespace") < pos("demo-v1"));
    assert!(pos("demo-namespace") < pos("demo-v2"));
    for pred in ["demo-v1", "demo-v2", "ingress-gateway"] {
        assert!(pos(pred) < pos("demo-routing"));
    }

    let report = Deployer::new(plan.failure_policy).submit(graph, &mut MemoryCluster::new());
    assert!(report.is_success());
}
