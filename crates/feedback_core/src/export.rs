use crate::schema::Report;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const NOT_AVAILABLE: &str = "N/A";

/// Flat row of the downloadable feedback table. Field names double as
/// column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Issue")]
    pub issue: String,
    #[serde(rename = "Feedback")]
    pub feedback: String,
    #[serde(rename = "Date")]
    pub created_at: String,
}

impl ExportRecord {
    fn from_report(report: &Report) -> Self {
        let ai = report.ai.as_ref();
        Self {
            name: or_na(report.reporter_name()),
            district: or_na(report.district()),
            category: or_na(ai.and_then(|ai| ai.category.as_deref())),
            priority: or_na(ai.and_then(|ai| ai.priority).map(|p| p.as_str())),
            issue: or_na(ai.and_then(|ai| ai.main_issue.as_deref())),
            feedback: report.feedback.original_text.clone(),
            created_at: report.created_at.clone(),
        }
    }
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

/// One record per analyzed report, in input order.
pub fn project(reports: &[Report]) -> Vec<ExportRecord> {
    reports
        .iter()
        .filter(|report| report.is_analyzed())
        .map(ExportRecord::from_report)
        .collect()
}

pub fn filter_by_district(records: Vec<ExportRecord>, district: Option<&str>) -> Vec<ExportRecord> {
    match district {
        None => records,
        Some(wanted) => records.into_iter().filter(|r| r.district == wanted).collect(),
    }
}
