//! Plan → loaded documents → units → validated graph.

use crate::Result;
use crate::graph::{DeploymentGraph, GraphBuilder};
use crate::group::{DocumentSet, UnitInput, group_units};
use crate::manifest::{Document, flatten, load_documents};
use crate::spec::{UnitSource, ValidatedPlan};
use anyhow::Context;
use tracing::info;

/// Build the deployment graph for `plan`. Any load, grouping or graph error
/// aborts before a single unit is submitted.
pub fn build_graph(plan: &ValidatedPlan) -> Result<DeploymentGraph> {
    // 1) Load every unit's documents.
    let mut inputs = Vec::with_capacity(plan.units.len());
    for unit in &plan.units {
        let input = match &unit.source {
            UnitSource::Files(files) => {
                let loaded = load_documents(&plan.manifests_dir, files)
                    .with_context(|| format!("load manifests for unit {}", unit.name))?;
                UnitInput::Documents(DocumentSet {
                    name: unit.name.clone(),
                    documents: flatten(loaded),
                })
            }
            UnitSource::Inline(values) => {
                let source = format!("inline:{}", unit.name);
                let documents = values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(i, v)| Document::from_value(&source, i, v.clone()))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .with_context(|| format!("load inline documents for unit {}", unit.name))?;
                UnitInput::Documents(DocumentSet {
                    name: unit.name.clone(),
                    documents,
                })
            }
            UnitSource::Chart(release) => UnitInput::Chart {
                name: unit.name.clone(),
                release: release.clone(),
            },
        };
        inputs.push(input);
    }

    // 2) Group into units.
    let units = group_units(inputs)?;

    // 3) Register units + edges, validate once.
    let mut builder = GraphBuilder::new();
    for unit in units {
        builder.add_unit(unit);
    }
    for (pred, dep) in &plan.edges {
        builder.add_edge(pred.as_str(), dep.as_str());
    }
    let graph = builder.build()?;

    info!(units = graph.len(), edges = plan.edges.len(), "deployment graph built");
    Ok(graph)
}
