//! Grouping: partition loaded documents into named deployable units.
//!
//! No document content is transformed here. A set with zero documents still
//! becomes a unit; applying it downstream is a no-op.

use crate::error::GroupError;
use crate::manifest::{Document, DocumentId};
use crate::spec::ChartRelease;
use std::collections::{BTreeMap, BTreeSet};

/// A named set of documents for one concern (e.g. "mesh components").
#[derive(Debug, Clone)]
pub struct DocumentSet {
    pub name: String,
    pub documents: Vec<Document>,
}

/// Input to grouping: either a document set or a packaged component.
#[derive(Debug, Clone)]
pub enum UnitInput {
    Documents(DocumentSet),
    Chart { name: String, release: ChartRelease },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitPayload {
    /// Ordered batch applied atomically. Order within the batch is the load
    /// order; it carries no dependency meaning.
    Manifests(Vec<Document>),
    Chart(ChartRelease),
}

/// A named batch deployed together.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub name: String,
    pub payload: UnitPayload,
}

impl Unit {
    pub fn manifests(name: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            payload: UnitPayload::Manifests(documents),
        }
    }

    pub fn chart(name: impl Into<String>, release: ChartRelease) -> Self {
        Self {
            name: name.into(),
            payload: UnitPayload::Chart(release),
        }
    }

    /// Documents in this unit; empty for chart units.
    pub fn documents(&self) -> &[Document] {
        match &self.payload {
            UnitPayload::Manifests(docs) => docs.as_slice(),
            UnitPayload::Chart(_) => &[],
        }
    }

    /// True when applying the unit has nothing to do.
    pub fn is_empty(&self) -> bool {
        matches!(&self.payload, UnitPayload::Manifests(docs) if docs.is_empty())
    }
}

/// Build one unit per input, preserving input order and document order.
///
/// Rejects duplicate unit names and any document identity that would be
/// owned by more than one unit (or listed twice in the same unit).
pub fn group_units(inputs: Vec<UnitInput>) -> Result<Vec<Unit>, GroupError> {
    let mut names = BTreeSet::new();
    let mut owners: BTreeMap<DocumentId, String> = BTreeMap::new();
    let mut units = Vec::with_capacity(inputs.len());

    for input in inputs {
        let unit = match input {
            UnitInput::Documents(set) => Unit::manifests(set.name, set.documents),
            UnitInput::Chart { name, release } => Unit::chart(name, release),
        };

        if !names.insert(unit.name.clone()) {
            return Err(GroupError::DuplicateUnit(unit.name));
        }

        for doc in unit.documents() {
            if let Some(first) = owners.insert(doc.id.clone(), unit.name.clone()) {
                return Err(GroupError::DuplicateDocument {
                    document: doc.id.to_string(),
                    first,
                    second: unit.name.clone(),
                });
            }
        }

        units.push(unit);
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(kind: &str, name: &str) -> Document {
        Document::from_value(
            "test.yaml",
            0,
            json!({ "kind": kind, "metadata": { "name": name, "namespace": "demo" } }),
        )
        .unwrap()
    }

    fn set(name: &str, documents: Vec<Document>) -> UnitInput {
        UnitInput::Documents(DocumentSet {
            name: name.to_string(),
            documents,
        })
    }

    #[test]
    fn one_unit_per_set_in_order() {
        let units = group_units(vec![
            set("app", vec![doc("Deployment", "v1"), doc("Service", "svc")]),
            set("routing", vec![doc("VirtualService", "vs")]),
        ])
        .unwrap();

        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["app", "routing"]);

        let docs: Vec<_> = units[0].documents().iter().map(|d| d.id.name.as_str()).collect();
        assert_eq!(docs, vec!["v1", "svc"]);
    }

    #[test]
    fn empty_set_still_yields_unit() {
        let units = group_units(vec![set("extras", vec![])]).unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].is_empty());
    }

    #[test]
    fn chart_units_are_not_empty() {
        let release: ChartRelease = serde_yaml::from_str(
            "release: istiod\nchart: istiod\nrepository: https://charts\nnamespace: istio-system\n",
        )
        .unwrap();
        let units = group_units(vec![UnitInput::Chart {
            name: "mesh-control-plane".into(),
            release,
        }])
        .unwrap();

        assert!(!units[0].is_empty());
        assert!(units[0].documents().is_empty());
    }

    #[test]
    fn rejects_duplicate_unit_names() {
        let err = group_units(vec![set("a", vec![]), set("a", vec![])]).unwrap_err();
        assert_eq!(err.to_string(), "duplicate unit name: a");
    }

    #[test]
    fn same_name_in_different_api_groups_is_not_a_duplicate() {
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

        let units = group_units(vec![
            set("mesh-gw", vec![gateway("networking.istio.io/v1beta1")]),
            set("api-gw", vec![gateway("gateway.networking.k8s.io/v1")]),
        ])
        .unwrap();
        assert_eq!(units.len(), 2);

        let err = group_units(vec![
            set("mesh-gw", vec![gateway("networking.istio.io/v1beta1")]),
            set("mesh-gw-v1", vec![gateway("networking.istio.io/v1")]),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "document Gateway.networking.istio.io/demo/demo appears in unit mesh-gw and again in unit mesh-gw-v1"
        );
    }

    #[test]
    fn rejects_document_owned_by_two_units() {
        let err = group_units(vec![
            set("v1", vec![doc("Service", "demo")]),
            set("v2", vec![doc("Service", "demo")]),
        ])
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "document Service/demo/demo appears in unit v1 and again in unit v2"
        );
    }
}
