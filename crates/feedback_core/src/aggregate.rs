use crate::schema::{PriorityLevel, Report};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub const UNKNOWN_ISSUE: &str = "Unknown Issue";
pub const GENERAL_CATEGORY: &str = "General";
pub const UNKNOWN_DISTRICT: &str = "Unknown";
pub const ANONYMOUS: &str = "Anonymous";

/// Reports sharing the same `(category, main_issue)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct GroupedIssue {
    pub category: String,
    pub main_issue: String,
    pub priority: PriorityLevel,
    pub total_reports: usize,
    pub districts: BTreeSet<String>,
    pub reporters: BTreeSet<String>,
}

impl GroupedIssue {
    fn start(key: (String, String), district: String, reporter: String, priority: PriorityLevel) -> Self {
        let (category, main_issue) = key;
        Self {
            category,
            main_issue,
            priority,
            total_reports: 1,
            districts: BTreeSet::from([district]),
            reporters: BTreeSet::from([reporter]),
        }
    }

    fn absorb(&mut self, district: String, reporter: String, priority: PriorityLevel) {
        self.total_reports += 1;
        self.districts.insert(district);
        self.reporters.insert(reporter);
        if priority > self.priority {
            self.priority = priority;
        }
    }

    /// "A, B, C (+2 others)" once more than `limit` districts contributed.
    pub fn districts_display(&self, limit: usize) -> String {
        truncated(&self.districts, limit, |hidden| format!(" (+{hidden} others)"))
    }

    /// "A, B, C and 2 others" once more than `limit` people reported it.
    pub fn reporters_display(&self, limit: usize) -> String {
        truncated(&self.reporters, limit, |hidden| format!(" and {hidden} others"))
    }
}

fn truncated(values: &BTreeSet<String>, limit: usize, suffix: impl Fn(usize) -> String) -> String {
    let shown: Vec<&str> = values.iter().take(limit).map(String::as_str).collect();
    let mut out = shown.join(", ");
    if values.len() > limit {
        out.push_str(&suffix(values.len() - limit));
    }
    out
}

/// Groups analyzed reports into issues, highest priority first and, within
/// the same priority, largest groups first. Unclassified input is skipped.
pub fn aggregate<'a, I>(reports: I) -> Vec<GroupedIssue>
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut issues: Vec<GroupedIssue> = Vec::new();
    let mut skipped = 0usize;

    for report in reports {
        let Some(ai) = &report.ai else {
            skipped += 1;
            continue;
        };

        let key = (
            ai.category.clone().unwrap_or_else(|| GENERAL_CATEGORY.to_string()),
            ai.main_issue.clone().unwrap_or_else(|| UNKNOWN_ISSUE.to_string()),
        );
        let district = report.district().unwrap_or(UNKNOWN_DISTRICT).to_string();
        let reporter = report.reporter_name().unwrap_or(ANONYMOUS).to_string();
        let priority = ai.priority.unwrap_or_default();

        match index.get(&key) {
            Some(&slot) => issues[slot].absorb(district, reporter, priority),
            None => {
                index.insert(key.clone(), issues.len());
                issues.push(GroupedIssue::start(key, district, reporter, priority));
            }
        }
    }

    // sort_by is stable: equal keys keep first-seen order
    issues.sort_by(|a, b| (b.priority, b.total_reports).cmp(&(a.priority, a.total_reports)));

    if skipped > 0 {
        debug!(skipped, "ignored unclassified reports during aggregation");
    }
    debug!(groups = issues.len(), "aggregated issues");
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{classified, reported_by, unclassified};
    use crate::schema::AiAnalysis;
    use crate::schema::PriorityLevel::{Critical, High, Low, Medium};

    fn repeated(category: &str, issue: &str, priority: PriorityLevel, count: usize) -> Vec<Report> {
        (0..count)
            .map(|n| classified(&format!("{issue}-{n}"), "Chennai", category, issue, priority))
            .collect()
    }

    #[test]
    fn merges_identical_issues() {
        let reports = vec![
            classified("a", "Chennai", "Water", "Pipe Burst", High),
            classified("b", "Chennai", "Water", "Pipe Burst", Critical),
        ];
        let issues = aggregate(&reports);
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.total_reports, 2);
        assert_eq!(issue.priority, Critical);
        assert_eq!(issue.districts, BTreeSet::from(["Chennai".to_string()]));
    }

    #[test]
    fn priority_dominates_volume() {
        let mut reports = repeated("Road", "Pothole", Low, 10);
        reports.extend(repeated("Water", "Pipe Burst", Critical, 1));
        reports.extend(repeated("Power", "Outage", High, 5));

        let order: Vec<(PriorityLevel, usize)> = aggregate(&reports)
            .iter()
            .map(|issue| (issue.priority, issue.total_reports))
            .collect();
        assert_eq!(order, vec![(Critical, 1), (High, 5), (Low, 10)]);
    }

    #[test]
    fn volume_breaks_priority_ties() {
        let mut reports = repeated("Road", "Pothole", High, 2);
        reports.extend(repeated("Water", "Leak", High, 4));
        let issues = aggregate(&reports);
        assert_eq!(issues[0].main_issue, "Leak");
        assert_eq!(issues[1].main_issue, "Pothole");
    }

    #[test]
    fn full_ties_keep_first_seen_order() {
        let reports = vec![
            classified("1", "Chennai", "Road", "Pothole", Medium),
            classified("2", "Chennai", "Water", "Leak", Medium),
            classified("3", "Chennai", "Health", "Clinic", Medium),
        ];
        let names: Vec<String> = aggregate(&reports).into_iter().map(|i| i.main_issue).collect();
        assert_eq!(names, vec!["Pothole", "Leak", "Clinic"]);
    }

    #[test]
    fn critical_report_always_lifts_the_group() {
        for base in [Low, Medium, High, Critical] {
            let mut reports = repeated("Water", "Leak", base, 3);
            reports.push(classified("late", "Madurai", "Water", "Leak", Critical));
            assert_eq!(aggregate(&reports)[0].priority, Critical);
        }
    }

    #[test]
    fn lower_priority_never_downgrades() {
        let reports = vec![
            classified("a", "Chennai", "Water", "Leak", High),
            classified("b", "Chennai", "Water", "Leak", Low),
        ];
        assert_eq!(aggregate(&reports)[0].priority, High);
    }

    #[test]
    fn key_is_case_sensitive_and_category_scoped() {
        let reports = vec![
            classified("a", "Chennai", "Water", "Leak", Low),
            classified("b", "Chennai", "Water", "leak", Low),
            classified("c", "Chennai", "Sanitation", "Leak", Low),
        ];
        assert_eq!(aggregate(&reports).len(), 3);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let mut reports = repeated("Road", "Pothole", Low, 3);
        reports.extend(repeated("Water", "Leak", High, 2));
        let first = aggregate(&reports);
        let second = aggregate(&reports);
        assert_eq!(first, second);
    }

    #[test]
    fn rolls_up_districts_and_deduplicates_reporters() {
        let reports = vec![
            reported_by(classified("a", "Chennai", "Water", "Leak", Low), "Kumar"),
            reported_by(classified("b", "Madurai", "Water", "Leak", Low), "Kumar"),
            classified("c", "Salem", "Water", "Leak", Low),
        ];
        let issue = &aggregate(&reports)[0];
        assert_eq!(issue.total_reports, 3);
        assert_eq!(issue.districts.len(), 3);
        assert_eq!(
            issue.reporters,
            BTreeSet::from(["Anonymous".to_string(), "Kumar".to_string()])
        );
    }

    #[test]
    fn missing_fields_use_fallbacks() {
        let mut report = unclassified("x", None);
        report.ai = Some(AiAnalysis::default());
        let issues = aggregate(&[report]);
        let issue = &issues[0];
        assert_eq!(issue.category, GENERAL_CATEGORY);
        assert_eq!(issue.main_issue, UNKNOWN_ISSUE);
        assert_eq!(issue.priority, Low);
        assert!(issue.districts.contains(UNKNOWN_DISTRICT));
        assert!(issue.reporters.contains(ANONYMOUS));
    }

    #[test]
    fn unclassified_input_is_ignored() {
        let reports = vec![
            unclassified("u", Some("Chennai")),
            classified("a", "Chennai", "Water", "Leak", Low),
        ];
        let issues = aggregate(&reports);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].total_reports, 1);
    }

    #[test]
    fn display_truncation() {
        let reports: Vec<Report> = ["Chennai", "Madurai", "Salem", "Erode", "Vellore"]
            .iter()
            .enumerate()
            .map(|(n, district)| {
                reported_by(
                    classified(&n.to_string(), district, "Water", "Leak", Low),
                    &format!("user{n}"),
                )
            })
            .collect();
        let issue = &aggregate(&reports)[0];
        assert_eq!(issue.districts_display(3), "Chennai, Erode, Madurai (+2 others)");
        assert_eq!(issue.reporters_display(3), "user0, user1, user2 and 2 others");
        assert_eq!(issue.districts_display(10), "Chennai, Erode, Madurai, Salem, Vellore");
    }
}
