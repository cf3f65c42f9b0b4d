use crate::schema::Report;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const OTHER_DEPARTMENT: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DistributionRow {
    pub department: String,
    pub count: usize,
}

/// Counts analyzed reports per department, optionally narrowed to one
/// district and constituency. Rows come back busiest department first.
pub fn summarize(
    reports: &[Report],
    district: Option<&str>,
    constituency: Option<&str>,
) -> Vec<DistributionRow> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for report in reports.iter().filter(|report| report.is_analyzed()) {
        if district.is_some_and(|wanted| report.district() != Some(wanted)) {
            continue;
        }
        if constituency.is_some_and(|wanted| report.constituency() != Some(wanted)) {
            continue;
        }
        let department = report.category().unwrap_or(OTHER_DEPARTMENT);
        *counts.entry(department).or_insert(0) += 1;
    }

    let mut rows: Vec<DistributionRow> = counts
        .into_iter()
        .map(|(department, count)| DistributionRow {
            department: department.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));

    debug!(
        district = district.unwrap_or("*"),
        constituency = constituency.unwrap_or("*"),
        departments = rows.len(),
        "summarized department distribution"
    );
    rows
}

/// Districts present among analyzed reports, for a district selector.
pub fn available_districts(reports: &[Report]) -> Vec<String> {
    reports
        .iter()
        .filter(|report| report.is_analyzed())
        .filter_map(|report| report.district())
        .filter(|district| !district.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Constituencies of `district` present among analyzed reports.
pub fn available_constituencies(reports: &[Report], district: &str) -> Vec<String> {
    reports
        .iter()
        .filter(|report| report.is_analyzed() && report.district() == Some(district))
        .filter_map(|report| report.constituency())
        .filter(|constituency| !constituency.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
