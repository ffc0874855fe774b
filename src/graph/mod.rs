//! Deployment graph: units plus explicit predecessor edges.
//!
//! `GraphBuilder` collects units and edges (the empty, unvalidated graph).
//! `build()` validates everything once and yields a `DeploymentGraph`, which
//! the deployer consumes by value.

pub mod builder;
pub mod topology;

pub use builder::GraphBuilder;
pub use topology::{DeploymentGraph, GraphState};
