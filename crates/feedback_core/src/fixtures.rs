use crate::schema::{AiAnalysis, FeedbackBody, Location, PriorityLevel, Report, Reporter};

pub fn unclassified(id: &str, district: Option<&str>) -> Report {
    Report {
        id: id.to_string(),
        created_at: "2025-01-01T00:00:00Z".to_string(),
        location: Location {
            district: district.map(str::to_string),
            constituency: None,
        },
        reporter: Reporter::default(),
        feedback: FeedbackBody {
            original_text: format!("feedback {id}"),
            ..FeedbackBody::default()
        },
        ai: None,
    }
}

pub fn classified(
    id: &str,
    district: &str,
    category: &str,
    main_issue: &str,
    priority: PriorityLevel,
) -> Report {
    let mut report = unclassified(id, Some(district));
    report.ai = Some(AiAnalysis {
        category: Some(category.to_string()),
        priority: Some(priority),
        main_issue: Some(main_issue.to_string()),
        summary: Some(format!("summary {id}")),
    });
    report
}

pub fn reported_by(mut report: Report, name: &str) -> Report {
    report.reporter.name = Some(name.to_string());
    report
}

pub fn in_constituency(mut report: Report, constituency: &str) -> Report {
    report.location.constituency = Some(constituency.to_string());
    report
}
