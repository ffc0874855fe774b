//! Input layer: the plan file schema + validated in-memory structures.
//!
//! This module is intentionally separate from manifest loading and
//! deployment. It owns:
//! - the plan file (units, sources, edges, policy, logging)
//! - chart release descriptions for packaged components

pub mod chart;
pub mod plan;

pub use chart::ChartRelease;
pub use plan::{PlanSpec, UnitSource, UnitSpec, ValidatedPlan};
