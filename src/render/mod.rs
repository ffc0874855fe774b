//! Rendering of plans and deployment reports (text for people, JSON for tools).

pub mod text;

use crate::Result;
use crate::deploy::DeploymentReport;
use crate::graph::DeploymentGraph;
use crate::group::UnitPayload;
use serde::Serialize;

pub use text::{render_plan_text, render_report_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanView {
    pub units: Vec<PlannedUnit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedUnit {
    /// 1-based submission position.
    pub position: usize,
    pub name: String,
    pub kind: &'static str,
    pub documents: Vec<String>,
    pub release: Option<String>,
    pub predecessors: Vec<String>,
}

/// Submission order of `graph` with each unit's content summary.
pub fn plan_view(graph: &DeploymentGraph) -> PlanView {
    let units = graph
        .order()
        .enumerate()
        .map(|(i, unit)| {
            let (kind, release) = match &unit.payload {
                UnitPayload::Manifests(_) => ("manifests", None),
                UnitPayload::Chart(r) => ("chart", Some(format!("{}/{}", r.namespace, r.release))),
            };
            PlannedUnit {
                position: i + 1,
                name: unit.name.clone(),
                kind,
                documents: unit.documents().iter().map(|d| d.id.to_string()).collect(),
                release,
                predecessors: graph
                    .predecessors(&unit.name)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }
        })
        .collect();
    PlanView { units }
}

pub fn render_plan(view: &PlanView, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_plan_text(view)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(view)?),
    }
}

pub fn render_report(report: &DeploymentReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_report_text(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}
