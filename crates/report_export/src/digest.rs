use anyhow::Result;
use feedback_core::aggregate::GroupedIssue;
use feedback_core::distribution::DistributionRow;
use feedback_core::schema::PriorityLevel;
use feedback_core::visibility::ReportCounts;
use std::fs;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub struct DigestInput<'a> {
    pub username: &'a str,
    pub counts: &'a ReportCounts,
    pub issues: &'a [GroupedIssue],
    pub distribution: &'a [DistributionRow],
    pub list_limit: usize,
}

/// Writes a markdown digest of one dashboard pass.
pub fn write_issue_digest(input: &DigestInput<'_>, path: &Path) -> Result<()> {
    let generated_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
    fs::write(path, render_digest(input, &generated_at))?;
    Ok(())
}

pub fn render_digest(input: &DigestInput<'_>, generated_at: &str) -> String {
    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("username: {}\n", input.username));
    md.push_str(&format!("generated_at: {generated_at}\n"));
    md.push_str("---\n\n");

    md.push_str("# Issue Digest\n\n");
    md.push_str("This digest is generated. Do not edit manually.\n\n");

    md.push_str("## Reports\n");
    md.push_str(&format!("- Total: `{}`\n", input.counts.total));
    md.push_str(&format!("- Processed: `{}`\n", input.counts.analyzed));
    md.push_str(&format!("- Pending: `{}`\n\n", input.counts.pending));

    md.push_str("## Top Issues\n\n");
    if input.issues.is_empty() {
        md.push_str("_No issues reported yet._\n");
    }
    for issue in input.issues {
        md.push_str(&format!(
            "### {} {} ({})\n",
            marker(issue.priority),
            issue.main_issue,
            issue.priority
        ));
        md.push_str(&format!("- Department: {}\n", issue.category));
        md.push_str(&format!("- Reports: {}\n", issue.total_reports));
        md.push_str(&format!(
            "- Locations: {}\n",
            issue.districts_display(input.list_limit)
        ));
        md.push_str(&format!(
            "- Reported by: {}\n\n",
            issue.reporters_display(input.list_limit)
        ));
    }

    md.push_str("\n## Department Distribution\n\n");
    if input.distribution.is_empty() {
        md.push_str("_No analyzed feedback available._\n");
    } else {
        md.push_str("| Department | Count |\n");
        md.push_str("|---|---|\n");
        for row in input.distribution {
            md.push_str(&format!("| {} | {} |\n", row.department, row.count));
        }
    }
    md
}

fn marker(priority: PriorityLevel) -> &'static str {
    match priority {
        PriorityLevel::Critical => "[!!]",
        PriorityLevel::High => "[!]",
        PriorityLevel::Medium | PriorityLevel::Low => "[-]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn issue() -> GroupedIssue {
        GroupedIssue {
            category: "Water".to_string(),
            main_issue: "Pipe Burst".to_string(),
            priority: PriorityLevel::Critical,
            total_reports: 5,
            districts: ["Chennai", "Erode", "Madurai", "Salem"].map(String::from).into(),
            reporters: BTreeSet::from(["Kumar".to_string()]),
        }
    }

    #[test]
    fn renders_issues_with_truncated_locations() {
        let counts = ReportCounts { total: 7, analyzed: 5, pending: 2 };
        let issues = vec![issue()];
        let distribution = vec![DistributionRow { department: "Water".to_string(), count: 5 }];
        let md = render_digest(
            &DigestInput {
                username: "root",
                counts: &counts,
                issues: &issues,
                distribution: &distribution,
                list_limit: 3,
            },
            "2025-01-01T00:00:00Z",
        );
        assert!(md.contains("### [!!] Pipe Burst (CRITICAL)"));
        assert!(md.contains("- Locations: Chennai, Erode, Madurai (+1 others)"));
        assert!(md.contains("- Pending: `2`"));
        assert!(md.contains("| Water | 5 |"));
    }

    #[test]
    fn empty_dashboard_renders_placeholders() {
        let counts = ReportCounts::default();
        let md = render_digest(
            &DigestInput {
                username: "a",
                counts: &counts,
                issues: &[],
                distribution: &[],
                list_limit: 3,
            },
            "2025-01-01T00:00:00Z",
        );
        assert!(md.contains("_No issues reported yet._"));
        assert!(md.contains("_No analyzed feedback available._"));
    }

    #[test]
    fn writes_digest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digest.md");
        let counts = ReportCounts::default();
        write_issue_digest(
            &DigestInput {
                username: "a",
                counts: &counts,
                issues: &[],
                distribution: &[],
                list_limit: 3,
            },
            &path,
        )
        .unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("---\nusername: a\n"));
    }
}
