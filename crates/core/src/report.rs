//! Report model - the periodic submission a student owes their mentor.

use serde::{Deserialize, Serialize};
use crate::deadline::deadline;
use crate::id::{MentorId, ReportId, StudentId};
use crate::Time;

/// Highest score a mentor can award.
pub const MAX_POINTS: f32 = 10.0;

/// A report instance tied to a student/mentor pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique identifier
    pub id: ReportId,

    /// Report type, fixed at creation
    #[serde(rename = "type")]
    pub kind: ReportType,

    /// Owning student
    pub student: StudentId,

    /// Mentor responsible for evaluation
    pub mentor: MentorId,

    /// Title
    pub title: String,

    /// Free text body
    pub content: String,

    /// Attached files (stored externally)
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// When the report is due
    pub deadline: Time,

    /// When the student submitted it
    pub submission_date: Option<Time>,

    /// Mentor evaluation
    pub evaluation: Option<Evaluation>,

    /// Lifecycle status
    pub status: ReportStatus,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

/// Report type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    /// Due every 15 days
    Fortnightly,
    /// Due every 30 days
    Assignment,
    /// Due at the end of the internship
    FinalEvaluation,
}

impl ReportType {
    /// All report types, in display order.
    pub const ALL: [ReportType; 3] = [
        ReportType::Fortnightly,
        ReportType::Assignment,
        ReportType::FinalEvaluation,
    ];

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Fortnightly => "FORTNIGHTLY",
            ReportType::Assignment => "ASSIGNMENT",
            ReportType::FinalEvaluation => "FINAL_EVALUATION",
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report status.
///
/// ```text
/// PENDING ──submit──▶ SUBMITTED ──evaluate──▶ EVALUATED
///    │                    │
///    └──────sweep─────────┴──────▶ OVERDUE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Created by the scheduler, waiting for the student
    Pending,
    /// Submitted, waiting for the mentor
    Submitted,
    /// Evaluated by the mentor
    Evaluated,
    /// Deadline passed before completion
    Overdue,
}

impl ReportStatus {
    /// Whether moving from `self` to `to` is a legal transition.
    ///
    /// `Evaluated -> Evaluated` is a revision of an existing evaluation.
    pub fn can_transition_to(self, to: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, to),
            (Pending, Submitted)
                | (Pending, Overdue)
                | (Submitted, Evaluated)
                | (Submitted, Overdue)
                | (Evaluated, Evaluated)
        )
    }

    /// Whether the overdue sweep applies to reports in this status.
    pub fn is_open(self) -> bool {
        matches!(self, ReportStatus::Pending | ReportStatus::Submitted)
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Submitted => "SUBMITTED",
            ReportStatus::Evaluated => "EVALUATED",
            ReportStatus::Overdue => "OVERDUE",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move report from {from} to {to}")]
pub struct TransitionError {
    /// Current status
    pub from: ReportStatus,
    /// Requested status
    pub to: ReportStatus,
}

/// Reference to a file held by the attachment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Public URL
    pub url: String,
    /// Storage-side identifier
    pub id: String,
    /// Original file name
    pub file_name: String,
}

/// A mentor's evaluation of a submitted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Score in `[0, MAX_POINTS]`
    pub points: f32,
    /// Written feedback
    pub feedback: String,
    /// Who evaluated
    pub evaluated_by: MentorId,
    /// When evaluated
    pub evaluated_at: Time,
}

impl Evaluation {
    /// Whether `points` is a finite score within `[0, MAX_POINTS]`.
    pub fn points_in_range(points: f32) -> bool {
        points.is_finite() && (0.0..=MAX_POINTS).contains(&points)
    }
}

impl Report {
    /// A report submitted directly by a student.
    ///
    /// The deadline is derived from the type, anchored at `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn new_submitted(
        kind: ReportType,
        student: StudentId,
        mentor: MentorId,
        title: impl Into<String>,
        content: impl Into<String>,
        attachments: Vec<Attachment>,
        internship_end: Time,
        now: Time,
    ) -> Self {
        Self {
            id: ReportId::new(),
            kind,
            student,
            mentor,
            title: title.into(),
            content: content.into(),
            attachments,
            deadline: deadline(kind, now, internship_end),
            submission_date: Some(now),
            evaluation: None,
            status: ReportStatus::Submitted,
            created_at: now,
            updated_at: now,
        }
    }

    /// A placeholder report created on a student's behalf.
    pub fn new_pending(
        kind: ReportType,
        student: StudentId,
        mentor: MentorId,
        title: impl Into<String>,
        content: impl Into<String>,
        deadline: Time,
        now: Time,
    ) -> Self {
        Self {
            id: ReportId::new(),
            kind,
            student,
            mentor,
            title: title.into(),
            content: content.into(),
            attachments: Vec::new(),
            deadline,
            submission_date: None,
            evaluation: None,
            status: ReportStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, to: ReportStatus, now: Time) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError { from: self.status, to });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Fill in a pending report and mark it submitted.
    pub fn submit(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        attachments: Vec<Attachment>,
        now: Time,
    ) -> Result<(), TransitionError> {
        self.transition(ReportStatus::Submitted, now)?;
        self.title = title.into();
        self.content = content.into();
        self.attachments = attachments;
        self.submission_date = Some(now);
        Ok(())
    }

    /// Attach an evaluation and mark the report evaluated.
    pub fn record_evaluation(&mut self, evaluation: Evaluation) -> Result<(), TransitionError> {
        let now = evaluation.evaluated_at;
        self.transition(ReportStatus::Evaluated, now)?;
        self.evaluation = Some(evaluation);
        Ok(())
    }

    /// Whether the overdue sweep should pick this report up at `now`.
    pub fn is_overdue_at(&self, now: Time) -> bool {
        self.status.is_open() && self.deadline < now
    }

    /// Mark the report overdue.
    pub fn mark_overdue(&mut self, now: Time) -> Result<(), TransitionError> {
        self.transition(ReportStatus::Overdue, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(day: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn pending() -> Report {
        Report::new_pending(
            ReportType::Fortnightly,
            StudentId::new(),
            MentorId::new(),
            "Fortnightly Report",
            "placeholder",
            at(16),
            at(1),
        )
    }

    #[test]
    fn test_submitted_report_has_type_deadline() {
        let end = at(31);
        let report = Report::new_submitted(
            ReportType::Assignment,
            StudentId::new(),
            MentorId::new(),
            "Week 4",
            "Did things",
            vec![],
            end,
            at(1),
        );
        assert_eq!(report.status, ReportStatus::Submitted);
        assert_eq!(report.submission_date, Some(at(1)));
        assert_eq!(report.deadline, at(1) + Duration::days(30));
    }

    #[test]
    fn test_transitions_only_move_forward() {
        use ReportStatus::*;
        assert!(Pending.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(Evaluated));
        assert!(Submitted.can_transition_to(Overdue));
        assert!(!Evaluated.can_transition_to(Overdue));
        assert!(!Overdue.can_transition_to(Submitted));
        assert!(!Overdue.can_transition_to(Evaluated));
        assert!(!Submitted.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Evaluated));
    }

    #[test]
    fn test_submit_pending_report() {
        let mut report = pending();
        report
            .submit("Done", "Real content", vec![], at(5))
            .unwrap();
        assert_eq!(report.status, ReportStatus::Submitted);
        assert_eq!(report.content, "Real content");
        assert_eq!(report.submission_date, Some(at(5)));
    }

    #[test]
    fn test_cannot_evaluate_pending_report() {
        let mut report = pending();
        let err = report
            .record_evaluation(Evaluation {
                points: 5.0,
                feedback: "ok".into(),
                evaluated_by: report.mentor,
                evaluated_at: at(3),
            })
            .unwrap_err();
        assert_eq!(err.from, ReportStatus::Pending);
        assert!(report.evaluation.is_none());
    }

    #[test]
    fn test_overdue_predicate() {
        let report = pending();
        assert!(!report.is_overdue_at(at(16)));
        assert!(report.is_overdue_at(at(17)));
    }

    #[test]
    fn test_points_range() {
        assert!(Evaluation::points_in_range(0.0));
        assert!(Evaluation::points_in_range(10.0));
        assert!(!Evaluation::points_in_range(-0.5));
        assert!(!Evaluation::points_in_range(10.5));
        assert!(!Evaluation::points_in_range(f32::NAN));
    }

    #[test]
    fn test_status_display_matches_wire_name() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::Submitted,
            ReportStatus::Evaluated,
            ReportStatus::Overdue,
        ] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, status.to_string());
        }
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(pending()).unwrap();
        assert_eq!(json["type"], "FORTNIGHTLY");
        assert_eq!(json["status"], "PENDING");
        assert!(json.get("submissionDate").is_some());
    }
}
