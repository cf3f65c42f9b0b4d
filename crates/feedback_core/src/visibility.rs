use crate::access::VisibilityScope;
use crate::schema::Report;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub total: usize,
    pub analyzed: usize,
    pub pending: usize,
}

impl ReportCounts {
    pub fn of(reports: &[Report]) -> Self {
        let total = reports.len();
        let analyzed = reports.iter().filter(|report| report.is_analyzed()).count();
        Self {
            total,
            analyzed,
            pending: total - analyzed,
        }
    }
}

/// Keeps the reports `scope` admits, preserving input order.
pub fn filter(reports: Vec<Report>, scope: &VisibilityScope) -> Vec<Report> {
    let before = reports.len();
    let visible: Vec<Report> = reports
        .into_iter()
        .filter(|report| scope.admits(report))
        .collect();
    debug!(before, after = visible.len(), "applied visibility scope");
    visible
}

pub fn analyzed(reports: &[Report]) -> impl Iterator<Item = &Report> {
    reports.iter().filter(|report| report.is_analyzed())
}
