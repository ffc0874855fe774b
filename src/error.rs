//! Error taxonomy for the deployment core.
//!
//! Load, group and graph errors are fatal and surface before any cluster
//! interaction. Apply errors are recorded per unit by the deployer.

use std::path::PathBuf;

/// Failure while reading or parsing manifest sources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("read manifest file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse manifest file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Document `index` (0-based, counting empty documents) is malformed.
    #[error("{source_name} document #{index}: {reason}")]
    Malformed {
        source_name: String,
        index: usize,
        reason: String,
    },
}

/// Failure while partitioning documents into units.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("duplicate unit name: {0}")]
    DuplicateUnit(String),

    #[error("document {document} appears in unit {first} and again in unit {second}")]
    DuplicateDocument {
        document: String,
        first: String,
        second: String,
    },
}

/// Failure while validating the deployment graph.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("deployment graph must contain at least 1 unit")]
    Empty,

    #[error("duplicate unit name: {0}")]
    DuplicateUnit(String),

    #[error("invalid unit name {0:?}: expected letters, digits, '.', '_' or '-'")]
    InvalidName(String),

    #[error("unit {unit} depends on unknown unit {predecessor}")]
    UnknownPredecessor { unit: String, predecessor: String },

    #[error("edge from {predecessor} targets unknown unit {unit}")]
    UnknownDependent { predecessor: String, unit: String },

    #[error("unit {0} declares itself as a predecessor")]
    SelfLoop(String),

    #[error("duplicate edge: {dependent} already depends on {predecessor}")]
    DuplicateEdge {
        predecessor: String,
        dependent: String,
    },

    #[error("cycle detected in deployment graph: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// Failure reported by an apply collaborator for a single unit.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("apply {unit} failed: {cause}")]
pub struct ApplyError {
    pub unit: String,
    pub cause: String,
}

impl ApplyError {
    pub fn new(unit: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            cause: cause.into(),
        }
    }
}
