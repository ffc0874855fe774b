//! Plan file (deploy.yaml): units, their sources and predecessor edges.
//!
//! YAML shape:
//! manifests_dir: manifests              # optional, relative to the plan file
//! failure_policy: continue-independent  # optional, or `abort`
//! logging: { level: info, format: pretty }
//! units:
//!   - name: demo-namespace
//!     inline:                           # documents written in place
//!       - { apiVersion: v1, kind: Namespace, metadata: { name: demo } }
//!   - name: mesh-base
//!     chart: { release: istio-base, chart: base, repository: ..., namespace: istio-system }
//!     depends_on: [mesh-namespace]
//!   - name: demo-routing
//!     files: [destination-rule.yaml, virtual-service.yaml]
//!     depends_on: [demo-v1, demo-v2]
//! edges:                                # optional extra [predecessor, dependent]
//!   - [demo-namespace, demo-v1]
//!
//! We check unit shape here (exactly one source, non-blank fields) and
//! resolve paths. Graph-level checks (unknown units, duplicates, cycles) belong
//! to the graph builder.

use crate::config::LoggingConfig;
use crate::deploy::FailurePolicy;
use crate::manifest::strict;
use crate::spec::ChartRelease;
use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanSpec {
    #[serde(default)]
    pub manifests_dir: Option<PathBuf>,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub logging: Option<LoggingConfig>,

    #[serde(default)]
    pub units: Vec<RawUnit>,

    /// Directed edges: [predecessor, dependent]
    #[serde(default)]
    pub edges: Vec<[String; 2]>,
}

/// Raw unit shape as it appears in the plan file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawUnit {
    pub name: String,

    #[serde(default)]
    pub files: Option<Vec<String>>,

    #[serde(default, deserialize_with = "strict::documents")]
    pub inline: Option<Vec<Value>>,

    #[serde(default)]
    pub chart: Option<ChartRelease>,

    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Where a unit's content comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitSource {
    Files(Vec<String>),
    Inline(Vec<Value>),
    Chart(ChartRelease),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    pub name: String,
    pub source: UnitSource,
}

#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub manifests_dir: PathBuf,
    pub failure_policy: FailurePolicy,
    pub logging: LoggingConfig,
    pub units: Vec<UnitSpec>,
    /// (predecessor, dependent), `depends_on` entries first in unit order,
    /// then the explicit `edges` list.
    pub edges: Vec<(String, String)>,
}

impl PlanSpec {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read plan file {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parse plan file {}", path.display()))
    }

    /// Validate unit shapes and resolve the manifest directory against
    /// `base_dir` (the directory holding the plan file).
    pub fn validate_and_build(&self, base_dir: &Path) -> anyhow::Result<ValidatedPlan> {
        let mut units = Vec::with_capacity(self.units.len());
        let mut edges = Vec::new();

        for raw in &self.units {
            let name = raw.name.trim();
            if name.is_empty() {
                bail!("plan contains a unit with an empty name");
            }

            let source = match (&raw.files, &raw.inline, &raw.chart) {
                (Some(files), None, None) => {
                    if let Some(bad) = files.iter().find(|f| f.trim().is_empty()) {
                        bail!("unit {} lists an empty file name {:?}", name, bad);
                    }
                    UnitSource::Files(files.clone())
                }
                (None, Some(docs), None) => UnitSource::Inline(docs.clone()),
                (None, None, Some(chart)) => {
                    let blank = chart.blank_fields();
                    if !blank.is_empty() {
                        bail!("unit {} chart has blank fields: {}", name, blank.join(", "));
                    }
                    UnitSource::Chart(chart.clone())
                }
                (None, None, None) => {
                    bail!("unit {} needs one of `files`, `inline` or `chart`", name)
                }
                _ => bail!(
                    "unit {} must declare exactly one of `files`, `inline` or `chart`",
                    name
                ),
            };

            for pred in &raw.depends_on {
                edges.push((pred.trim().to_string(), name.to_string()));
            }

            units.push(UnitSpec {
                name: name.to_string(),
                source,
            });
        }

        if units.is_empty() {
            bail!("plan contained no units");
        }

        for [pred, dependent] in &self.edges {
            edges.push((pred.trim().to_string(), dependent.trim().to_string()));
        }

        let manifests_dir = match &self.manifests_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        };

        Ok(ValidatedPlan {
            manifests_dir,
            failure_policy: self.failure_policy,
            logging: self.logging.clone().unwrap_or_default(),
            units,
            edges,
        })
    }
}
