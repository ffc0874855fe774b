//! Process-backed cluster: `kubectl apply` for manifest batches and
//! `helm upgrade --install` for chart releases.
//!
//! Both commands are idempotent, which is what makes re-running a deployment
//! safe. Neither tool understands unit dependencies; ordering is entirely the
//! deployer's job, so predecessors are only logged here.
//!
//! A chart release is upgraded only when the installed one differs: `helm
//! list` gives the deployed chart and version, `helm get values` the values.
//! Unpinned charts always upgrade, since "latest" cannot be compared locally.

use crate::deploy::{ApplyOutcome, ClusterApply};
use crate::error::ApplyError;
use crate::manifest::Document;
use crate::spec::ChartRelease;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::debug;

// Capture:
// 1) object: kind.group/name
// 2) verb
// Optional trailing "(server dry run)" or similar.
static APPLY_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+/\S+)\s+(created|configured|unchanged|serverside-applied)(?:\s+\(.*\))?\s*$")
        .expect("apply line pattern")
});

#[derive(Debug, Clone)]
pub struct KubectlCluster {
    kubectl: PathBuf,
    helm: PathBuf,
    context: Option<String>,
}

impl KubectlCluster {
    pub fn new(kubectl: impl Into<PathBuf>, helm: impl Into<PathBuf>) -> Self {
        Self {
            kubectl: kubectl.into(),
            helm: helm.into(),
            context: None,
        }
    }

    /// Target a specific kubeconfig context instead of the current one.
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    fn manifest_args(&self) -> Vec<String> {
        let mut args = vec!["apply".to_string(), "-f".into(), "-".into()];
        if let Some(ctx) = &self.context {
            args.push("--context".into());
            args.push(ctx.clone());
        }
        args
    }

    fn chart_args(&self, release: &ChartRelease) -> Vec<String> {
        let mut args = vec![
            "upgrade".to_string(),
            "--install".into(),
            release.release.clone(),
            release.chart.clone(),
            "--repo".into(),
            release.repository.clone(),
            "--namespace".into(),
            release.namespace.clone(),
            "--values".into(),
            "-".into(),
        ];
        if release.create_namespace {
            args.push("--create-namespace".into());
        }
        if let Some(version) = &release.version {
            args.push("--version".into());
            args.push(version.clone());
        }
        self.helm_context(args)
    }

    fn list_args(&self, release: &ChartRelease) -> Vec<String> {
        let args = vec![
            "list".to_string(),
            "--namespace".into(),
            release.namespace.clone(),
            "--filter".into(),
            format!("^{}$", regex::escape(&release.release)),
            "--output".into(),
            "json".into(),
        ];
        self.helm_context(args)
    }

    fn values_args(&self, release: &ChartRelease) -> Vec<String> {
        let args = vec![
            "get".to_string(),
            "values".into(),
            release.release.clone(),
            "--namespace".into(),
            release.namespace.clone(),
            "--output".into(),
            "json".into(),
        ];
        self.helm_context(args)
    }

    fn helm_context(&self, mut args: Vec<String>) -> Vec<String> {
        if let Some(ctx) = &self.context {
            args.push("--kube-context".into());
            args.push(ctx.clone());
        }
        args
    }

    /// Whether the installed release already matches `release`.
    fn release_is_current(&self, release: &ChartRelease) -> Result<bool, String> {
        let listing = run(&self.helm, &self.list_args(release), "")?;
        if !deployed_chart_matches(&listing, release)? {
            return Ok(false);
        }
        let values = run(&self.helm, &self.values_args(release), "")?;
        installed_values_match(&values, release)
    }
}

impl ClusterApply for KubectlCluster {
    fn apply_manifests(
        &mut self,
        unit: &str,
        documents: &[Document],
        predecessors: &[&str],
    ) -> Result<ApplyOutcome, ApplyError> {
        debug!(unit, ?predecessors, documents = documents.len(), "kubectl apply");
        let list = manifest_list(documents);
        let stdout = run(&self.kubectl, &self.manifest_args(), &list.to_string())
            .map_err(|cause| ApplyError::new(unit, cause))?;
        Ok(ApplyOutcome {
            changed: count_changes(&stdout),
        })
    }

    fn apply_chart(
        &mut self,
        unit: &str,
        release: &ChartRelease,
        predecessors: &[&str],
    ) -> Result<ApplyOutcome, ApplyError> {
        if self
            .release_is_current(release)
            .map_err(|cause| ApplyError::new(unit, cause))?
        {
            debug!(unit, release = %release.release, "release already up to date");
            return Ok(ApplyOutcome { changed: 0 });
        }

        debug!(unit, ?predecessors, release = %release.release, "helm upgrade --install");
        let values = Value::Object(release.values.clone()).to_string();
        run(&self.helm, &self.chart_args(release), &values)
            .map_err(|cause| ApplyError::new(unit, cause))?;
        Ok(ApplyOutcome { changed: 1 })
    }
}

/// One row of `helm list --output json`.
#[derive(Debug, Deserialize)]
struct ListedRelease {
    name: String,
    /// `<chart>-<version>`, e.g. `base-1.20.0`.
    chart: String,
    status: String,
}

/// True when `listing` shows `release` deployed from the pinned chart version.
fn deployed_chart_matches(listing: &str, release: &ChartRelease) -> Result<bool, String> {
    let rows: Vec<ListedRelease> =
        serde_json::from_str(listing).map_err(|e| format!("parse helm list output: {}", e))?;
    let Some(version) = &release.version else {
        return Ok(false);
    };
    let expected = format!("{}-{}", release.chart, version);
    Ok(rows
        .iter()
        .any(|r| r.name == release.release && r.status == "deployed" && r.chart == expected))
}

/// True when the user-supplied values of the installed release equal
/// `release.values`. helm prints `null` when none were supplied.
fn installed_values_match(stdout: &str, release: &ChartRelease) -> Result<bool, String> {
    let installed: Value =
        serde_json::from_str(stdout).map_err(|e| format!("parse helm values output: {}", e))?;
    let installed = match installed {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => return Err(format!("unexpected helm values output: {}", other)),
    };
    Ok(installed == release.values)
}

/// Wrap a batch into a single `v1/List` so kubectl applies it in one call.
fn manifest_list(documents: &[Document]) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "List",
        "items": documents.iter().map(|d| d.body.clone()).collect::<Vec<_>>(),
    })
}

/// Count objects kubectl reported as created or configured.
fn count_changes(stdout: &str) -> usize {
    stdout
        .lines()
        .filter_map(|line| APPLY_LINE_RE.captures(line))
        .filter(|caps| &caps[2] != "unchanged")
        .count()
}

/// Run `program args`, feeding `input` on stdin. Returns stdout, or a cause
/// built from stderr on a non-zero exit.
fn run(program: &Path, args: &[String], input: &str) -> Result<String, String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("spawn {}: {}", program.display(), e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(|e| format!("write stdin of {}: {}", program.display(), e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("wait for {}: {}", program.display(), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
