//! mesh-deploy: dependency-ordered deployment of service-mesh units.
//!
//! Data flows strictly forward:
//!
//! - [`manifest`] loads multi-document YAML sources into structured documents
//! - [`group`] partitions documents into named deployable units
//! - [`graph`] validates units plus explicit predecessor edges (acyclic)
//! - [`deploy`] submits units in dependency order to a [`deploy::ClusterApply`]
//!
//! [`spec`] owns the plan file, [`pipeline`] wires the stages together and
//! [`render`] prints plans and reports.

pub mod config;
pub mod deploy;
pub mod error;
pub mod graph;
pub mod group;
pub mod manifest;
pub mod pipeline;
pub mod render;
pub mod spec;

pub type Result<T> = anyhow::Result<T>;
