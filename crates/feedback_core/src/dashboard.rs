use crate::access::{resolve, VisibilityScope};
use crate::aggregate::{aggregate, GroupedIssue};
use crate::db::ReportStore;
use crate::distribution::{summarize, DistributionRow};
use crate::export::{project, ExportRecord};
use crate::schema::{AdminIdentity, Report};
use crate::visibility::{filter, ReportCounts};
use anyhow::Result;
use serde::Serialize;
use tracing::info;

/// Every view of one render pass, derived from the same filtered snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub username: String,
    pub scope: VisibilityScope,
    pub counts: ReportCounts,
    pub issues: Vec<GroupedIssue>,
    pub distribution: Vec<DistributionRow>,
    pub export: Vec<ExportRecord>,
    #[serde(skip)]
    pub visible: Vec<Report>,
}

impl Dashboard {
    pub fn build<S: ReportStore + ?Sized>(store: &S, identity: &AdminIdentity) -> Result<Self> {
        let snapshot = store.fetch_all_desc()?;
        Ok(Self::from_snapshot(snapshot, identity))
    }

    pub fn from_snapshot(snapshot: Vec<Report>, identity: &AdminIdentity) -> Self {
        let scope = resolve(identity);
        let visible = filter(snapshot, &scope);
        let counts = ReportCounts::of(&visible);
        let issues = aggregate(&visible);
        let distribution = summarize(&visible, None, None);
        let export = project(&visible);

        info!(
            username = %identity.username,
            role = %identity.role,
            total = counts.total,
            analyzed = counts.analyzed,
            pending = counts.pending,
            issues = issues.len(),
            "built dashboard"
        );

        Self {
            username: identity.username.clone(),
            scope,
            counts,
            issues,
            distribution,
            export,
            visible,
        }
    }

    /// Distribution narrowed to a district and optionally a constituency,
    /// computed from the same visible set as the rest of the dashboard.
    pub fn distribution_for(&self, district: Option<&str>, constituency: Option<&str>) -> Vec<DistributionRow> {
        summarize(&self.visible, district, constituency)
    }
}
