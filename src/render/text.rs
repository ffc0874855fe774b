use crate::deploy::{DeploymentReport, UnitStatus};
use crate::render::PlanView;
use std::fmt::Write;

/// One block per unit in submission order.
///
/// Example:
///   2. mesh-base  chart istio-system/istio-base  after: mesh-namespace
pub fn render_plan_text(view: &PlanView) -> String {
    let width = view.units.iter().map(|u| u.name.len()).max().unwrap_or(0);
    let mut out = String::new();

    for unit in &view.units {
        let content = match &unit.release {
            Some(release) => format!("chart {}", release),
            None => format!("{} document(s)", unit.documents.len()),
        };
        let after = if unit.predecessors.is_empty() {
            "-".to_string()
        } else {
            unit.predecessors.join(", ")
        };
        let _ = writeln!(
            out,
            "{:>3}. {:<width$}  {}  after: {}",
            unit.position,
            unit.name,
            content,
            after,
            width = width
        );
        for doc in &unit.documents {
            let _ = writeln!(out, "       - {}", doc);
        }
    }
    out
}

/// Summary line followed by succeeded, failed and skipped units.
pub fn render_report_text(report: &DeploymentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "deployment {}: {} succeeded, {} failed, {} skipped, {} object(s) changed",
        report.state,
        report.succeeded().len(),
        report.failed().len(),
        report.skipped().len(),
        report.changed()
    );

    for unit in &report.units {
        let line = match &unit.status {
            UnitStatus::Succeeded { changed } => format!("  ok      {} ({} changed)", unit.name, changed),
            UnitStatus::Failed { cause } => format!("  FAILED  {}: {}", unit.name, cause),
            UnitStatus::Skipped { blocked_by, aborted: true } => {
                format!("  skipped {} (aborted after {} failed)", unit.name, blocked_by)
            }
            UnitStatus::Skipped { blocked_by, aborted: false } => {
                format!("  skipped {} (waiting on {})", unit.name, blocked_by)
            }
        };
        let _ = writeln!(out, "{}", line);
    }
    out
}
