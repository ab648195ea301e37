//! Report analytics for a student or a mentor.

use serde::Serialize;
use internhub_core::{MentorId, Report, ReportStatus, ReportType, StudentId};

/// Whose reports to summarise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsScope {
    /// Reports owned by a student
    Student(StudentId),
    /// Reports assigned to a mentor
    Mentor(MentorId),
}

/// Aggregate numbers over a set of reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Number of reports
    pub total_reports: usize,
    /// Reports in EVALUATED status
    pub evaluated_reports: usize,
    /// Awarded points divided by the report count (0 with no reports)
    pub average_score: f32,
    /// Count per report type
    pub report_types: ReportTypeCounts,
}

/// Report count per type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTypeCounts {
    /// Fortnightly reports
    #[serde(rename = "FORTNIGHTLY")]
    pub fortnightly: usize,
    /// Assignments
    #[serde(rename = "ASSIGNMENT")]
    pub assignment: usize,
    /// Final evaluations
    #[serde(rename = "FINAL_EVALUATION")]
    pub final_evaluation: usize,
}

impl AnalyticsSummary {
    /// Summarise `reports`.
    ///
    /// The average divides by every report, not just evaluated ones.
    pub fn from_reports(reports: &[Report]) -> Self {
        let mut report_types = ReportTypeCounts::default();
        let mut evaluated_reports = 0;
        let mut points = 0.0f32;

        for report in reports {
            match report.kind {
                ReportType::Fortnightly => report_types.fortnightly += 1,
                ReportType::Assignment => report_types.assignment += 1,
                ReportType::FinalEvaluation => report_types.final_evaluation += 1,
            }
            if report.status == ReportStatus::Evaluated {
                evaluated_reports += 1;
            }
            if let Some(evaluation) = &report.evaluation {
                points += evaluation.points;
            }
        }

        let average_score = if reports.is_empty() {
            0.0
        } else {
            points / reports.len() as f32
        };

        Self {
            total_reports: reports.len(),
            evaluated_reports,
            average_score,
            report_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use internhub_core::Evaluation;

    fn report(kind: ReportType, points: Option<f32>) -> Report {
        let now = Utc::now();
        let mut report = Report::new_submitted(
            kind,
            StudentId::new(),
            MentorId::new(),
            "title",
            "content",
            vec![],
            now,
            now,
        );
        if let Some(points) = points {
            report
                .record_evaluation(Evaluation {
                    points,
                    feedback: "fine".into(),
                    evaluated_by: report.mentor,
                    evaluated_at: now,
                })
                .unwrap();
        }
        report
    }

    #[test]
    fn test_empty_summary() {
        let summary = AnalyticsSummary::from_reports(&[]);
        assert_eq!(summary.total_reports, 0);
        assert_eq!(summary.average_score, 0.0);
    }

    #[test]
    fn test_average_over_all_reports() {
        let reports = vec![
            report(ReportType::Fortnightly, Some(8.0)),
            report(ReportType::Fortnightly, Some(6.0)),
            report(ReportType::Assignment, None),
            report(ReportType::FinalEvaluation, None),
        ];
        let summary = AnalyticsSummary::from_reports(&reports);
        assert_eq!(summary.total_reports, 4);
        assert_eq!(summary.evaluated_reports, 2);
        assert_eq!(summary.average_score, 3.5);
        assert_eq!(summary.report_types.fortnightly, 2);
        assert_eq!(summary.report_types.assignment, 1);
        assert_eq!(summary.report_types.final_evaluation, 1);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(AnalyticsSummary::from_reports(&[])).unwrap();
        assert!(json.get("averageScore").is_some());
        assert_eq!(json["reportTypes"]["FINAL_EVALUATION"], 0);
    }
}
