//! Report lifecycle manager.

use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::Utc;
use internhub_core::{
    deadline, whole_days_between, Attachment, Evaluation, MentorId, Notification,
    NotificationKind, RecipientKind, Report, ReportId, ReportStatus, ReportType, Student,
    StudentId, StudentProgress, Time, ASSIGNMENT_PERIOD_DAYS, FORTNIGHTLY_PERIOD_DAYS,
};
use internhub_notify::Notifier;
use internhub_storage::{ReportFilter, Storage};
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsScope, AnalyticsSummary};
use crate::error::{LifecycleError, Result};

/// Days before the internship end at which the final evaluation is created.
const FINAL_EVALUATION_LEAD_DAYS: i64 = 5;

/// Lifecycle configuration.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Let mentors overwrite an existing evaluation
    pub allow_reevaluation: bool,

    /// Notify students when the scheduler creates a report for them
    pub notify_due_reports: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            allow_reevaluation: true,
            notify_due_reports: true,
        }
    }
}

impl LifecycleConfig {
    /// Allow or forbid re-evaluation.
    pub fn with_reevaluation(mut self, allow: bool) -> Self {
        self.allow_reevaluation = allow;
        self
    }

    /// Enable or disable due-report notifications.
    pub fn with_due_notifications(mut self, enabled: bool) -> Self {
        self.notify_due_reports = enabled;
        self
    }
}

/// A direct submission by a student.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    /// Submitting student (authenticated caller)
    pub student: StudentId,
    /// Report type
    pub kind: ReportType,
    /// Title
    pub title: String,
    /// Body
    pub content: String,
    /// Attached files
    pub attachments: Vec<Attachment>,
}

/// Reports assigned to a mentor.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorReports {
    /// Submitted and waiting for evaluation
    pub pending_reports: Vec<Report>,
    /// Everything, newest first
    pub all_reports: Vec<Report>,
}

/// Owns report state transitions and the progress aggregate.
///
/// Every operation is a sequence of independent store round-trips. A crash
/// between saving a report and recomputing progress leaves the aggregate
/// stale until the next recompute.
pub struct ReportLifecycleManager<S: Storage, N: Notifier> {
    storage: Arc<S>,
    notifier: Arc<N>,
    config: LifecycleConfig,
}

impl<S: Storage, N: Notifier> Clone for ReportLifecycleManager<S, N> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: Storage, N: Notifier> ReportLifecycleManager<S, N> {
    /// Create a new lifecycle manager.
    pub fn new(storage: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            storage,
            notifier,
            config: LifecycleConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Get a reference to the storage.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    async fn load_student(&self, id: StudentId) -> Result<Student> {
        self.storage
            .load_student(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("student {}", id)))
    }

    async fn load_report(&self, id: ReportId) -> Result<Report> {
        self.storage
            .load_report(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("report {}", id)))
    }

    /// Create a submitted report on behalf of a student.
    pub async fn submit(&self, request: SubmitReport) -> Result<Report> {
        validate_text(&request.title, &request.content)?;

        let student = self.load_student(request.student).await?;
        let mentor = student
            .internal_mentor
            .ok_or(LifecycleError::UnassignedMentor(student.id))?;

        let report = Report::new_submitted(
            request.kind,
            student.id,
            mentor,
            request.title,
            request.content,
            request.attachments,
            student.internship.end_date,
            Utc::now(),
        );
        self.storage.save_report(&report).await?;
        info!("Report {} ({}) submitted by student {}", report.id, report.kind, student.id);

        self.recompute_progress(student.id).await?;
        self.notify_submitted(&student, mentor, &report).await;

        Ok(report)
    }

    /// Fill in a pending report created by the scheduler.
    pub async fn submit_pending(
        &self,
        report_id: ReportId,
        student: StudentId,
        title: String,
        content: String,
        attachments: Vec<Attachment>,
    ) -> Result<Report> {
        validate_text(&title, &content)?;

        let mut report = self.load_report(report_id).await?;
        if report.student != student {
            return Err(LifecycleError::Validation(format!(
                "report {} does not belong to student {}",
                report_id, student
            )));
        }

        report.submit(title, content, attachments, Utc::now())?;
        self.storage.save_report(&report).await?;
        info!("Pending report {} submitted by student {}", report.id, student);

        self.recompute_progress(student).await?;
        let owner = self.load_student(student).await?;
        self.notify_submitted(&owner, report.mentor, &report).await;

        Ok(report)
    }

    async fn notify_submitted(&self, student: &Student, mentor: MentorId, report: &Report) {
        self.notifier
            .notify(Notification::new(
                mentor.to_string(),
                RecipientKind::Mentor,
                NotificationKind::ReportSubmitted,
                "New Report Submitted",
                format!(
                    "{} submitted a {} report: {}",
                    student.full_name(),
                    report.kind,
                    report.title
                ),
            ))
            .await;
    }

    /// Record a mentor's evaluation of a submitted report.
    pub async fn evaluate(
        &self,
        report_id: ReportId,
        points: f32,
        feedback: String,
        evaluator: MentorId,
    ) -> Result<Report> {
        if !Evaluation::points_in_range(points) {
            return Err(LifecycleError::Validation(format!(
                "points must be between 0 and 10, got {}",
                points
            )));
        }

        let mut report = self.load_report(report_id).await?;
        if report.status == ReportStatus::Evaluated {
            if !self.config.allow_reevaluation {
                return Err(LifecycleError::AlreadyEvaluated(report.id));
            }
            info!("Revising evaluation of report {}", report.id);
        }

        report.record_evaluation(Evaluation {
            points,
            feedback,
            evaluated_by: evaluator,
            evaluated_at: Utc::now(),
        })?;
        self.storage.save_report(&report).await?;
        info!("Report {} evaluated by mentor {} ({} points)", report.id, evaluator, points);

        self.recompute_progress(report.student).await?;
        self.notifier
            .notify(Notification::new(
                report.student.to_string(),
                RecipientKind::Student,
                NotificationKind::ReportEvaluated,
                "Report Evaluated",
                format!("Your {} report \"{}\" scored {}/10.", report.kind, report.title, points),
            ))
            .await;

        Ok(report)
    }

    /// Create the reports that fall due for a student on `today`.
    ///
    /// A fortnightly report is due every 15 days after the internship start,
    /// an assignment every 30 days and the final evaluation exactly five days
    /// before the end. A report already generated for the same student, type
    /// and deadline day is not created again.
    pub async fn generate_due_reports(&self, student_id: StudentId, today: Time) -> Result<Vec<Report>> {
        let student = self.load_student(student_id).await?;
        let mentor = student
            .internal_mentor
            .ok_or(LifecycleError::UnassignedMentor(student.id))?;

        let start = student.internship.start_date;
        let end = student.internship.end_date;
        let days_since_start = whole_days_between(start, today);
        if days_since_start < 0 {
            debug!("Internship of student {} has not started yet", student.id);
            return Ok(Vec::new());
        }

        let mut due = Vec::new();
        if days_since_start % FORTNIGHTLY_PERIOD_DAYS == 0 {
            due.push(ReportType::Fortnightly);
        }
        if days_since_start % ASSIGNMENT_PERIOD_DAYS == 0 {
            due.push(ReportType::Assignment);
        }
        if whole_days_between(today, end) == FINAL_EVALUATION_LEAD_DAYS {
            due.push(ReportType::FinalEvaluation);
        }

        let mut created = Vec::new();
        for kind in due {
            let due_at = deadline(kind, today, end);
            if self.already_generated(student.id, kind, due_at).await? {
                debug!("Skipping duplicate {} report for student {}", kind, student.id);
                continue;
            }

            let (title, content) = placeholder(kind, today);
            let report = Report::new_pending(kind, student.id, mentor, title, content, due_at, today);
            self.storage.save_report(&report).await?;
            info!("Created {} report {} for student {}", kind, report.id, student.id);
            created.push(report);
        }

        if created.is_empty() {
            return Ok(created);
        }

        self.recompute_progress(student.id).await?;
        if self.config.notify_due_reports {
            for report in &created {
                self.notifier
                    .notify(Notification::new_at(
                        student.id.to_string(),
                        RecipientKind::Student,
                        NotificationKind::ReportDue,
                        "New Report Due",
                        format!(
                            "{} is due on {}.",
                            report.title,
                            report.deadline.format("%Y-%m-%d")
                        ),
                        today,
                    ))
                    .await;
            }
        }

        Ok(created)
    }

    async fn already_generated(&self, student: StudentId, kind: ReportType, due_at: Time) -> Result<bool> {
        let filter = ReportFilter {
            kind: Some(kind),
            ..ReportFilter::for_student(student)
        };
        let day = due_at.date_naive();
        Ok(self
            .storage
            .list_reports(&filter)
            .await?
            .iter()
            .any(|r| r.deadline.date_naive() == day))
    }

    /// Recompute and persist a student's progress from all of their reports.
    pub async fn recompute_progress(&self, student_id: StudentId) -> Result<StudentProgress> {
        let mut student = self.load_student(student_id).await?;
        let reports = self
            .storage
            .list_reports(&ReportFilter::for_student(student_id))
            .await?;

        let completed = reports
            .iter()
            .filter(|r| r.status == ReportStatus::Evaluated)
            .count();
        let progress = StudentProgress::from_counts(reports.len(), completed);
        debug!(
            "Student {} progress: {}/{} ({:.1}%)",
            student_id, completed, reports.len(), progress.overall_completion_percentage
        );

        student.progress = progress.clone();
        self.storage.save_student(&student).await?;
        Ok(progress)
    }

    /// Mark every open report past its deadline as overdue.
    ///
    /// Each affected student gets one notification, however many of their
    /// reports went overdue. If a save fails, students whose reports were
    /// already saved are still notified before the error is returned.
    pub async fn sweep_overdue(&self, now: Time) -> Result<Vec<Report>> {
        let filter = ReportFilter {
            statuses: Some(vec![ReportStatus::Pending, ReportStatus::Submitted]),
            deadline_before: Some(now),
            ..Default::default()
        };

        let mut overdue = Vec::new();
        let mut failure = None;
        for mut report in self.storage.list_reports(&filter).await? {
            if let Err(e) = self.mark_and_save_overdue(&mut report, now).await {
                failure = Some(e);
                break;
            }
            debug!("Report {} is overdue", report.id);
            overdue.push(report);
        }

        // Overdue reports leave both progress counts unchanged.
        let students = self.notify_overdue(&overdue, now).await;

        if let Some(e) = failure {
            warn!(
                "Overdue sweep stopped after {} reports: {}",
                overdue.len(),
                e
            );
            return Err(e);
        }
        if !overdue.is_empty() {
            info!("Marked {} reports overdue for {} students", overdue.len(), students);
        }
        Ok(overdue)
    }

    async fn mark_and_save_overdue(&self, report: &mut Report, now: Time) -> Result<()> {
        report.mark_overdue(now)?;
        self.storage.save_report(report).await?;
        Ok(())
    }

    /// Send one reminder per student; returns the number of students.
    async fn notify_overdue(&self, overdue: &[Report], now: Time) -> usize {
        let mut by_student: BTreeMap<StudentId, Vec<&Report>> = BTreeMap::new();
        for report in overdue {
            by_student.entry(report.student).or_default().push(report);
        }

        for (student, reports) in &by_student {
            let message = match reports.as_slice() {
                [one] => format!(
                    "Your {} report is overdue. Please submit as soon as possible.",
                    one.kind
                ),
                many => format!(
                    "You have {} overdue reports ({}). Please submit as soon as possible.",
                    many.len(),
                    many.iter().map(|r| r.kind.as_str()).collect::<Vec<_>>().join(", ")
                ),
            };
            self.notifier
                .notify(Notification::new_at(
                    student.to_string(),
                    RecipientKind::Student,
                    NotificationKind::DeadlineReminder,
                    "Report Overdue",
                    message,
                    now,
                ))
                .await;
        }
        by_student.len()
    }

    /// Reports owned by a student, newest first.
    pub async fn reports_for_student(&self, student: StudentId) -> Result<Vec<Report>> {
        Ok(self
            .storage
            .list_reports(&ReportFilter::for_student(student))
            .await?)
    }

    /// Reports assigned to a mentor, with the ones awaiting evaluation split out.
    pub async fn reports_for_mentor(&self, mentor: MentorId) -> Result<MentorReports> {
        let all_reports = self
            .storage
            .list_reports(&ReportFilter::for_mentor(mentor))
            .await?;
        let pending_reports = all_reports
            .iter()
            .filter(|r| r.status == ReportStatus::Submitted)
            .cloned()
            .collect();

        Ok(MentorReports {
            pending_reports,
            all_reports,
        })
    }

    /// Summary numbers for a student's or mentor's reports.
    pub async fn analytics(&self, scope: AnalyticsScope) -> Result<AnalyticsSummary> {
        let filter = match scope {
            AnalyticsScope::Student(id) => ReportFilter::for_student(id),
            AnalyticsScope::Mentor(id) => ReportFilter::for_mentor(id),
        };
        let reports = self.storage.list_reports(&filter).await?;
        Ok(AnalyticsSummary::from_reports(&reports))
    }
}

fn validate_text(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(LifecycleError::Validation("title is required".to_string()));
    }
    if content.trim().is_empty() {
        return Err(LifecycleError::Validation("content is required".to_string()));
    }
    Ok(())
}

fn placeholder(kind: ReportType, today: Time) -> (String, String) {
    let date = today.format("%Y-%m-%d");
    match kind {
        ReportType::Fortnightly => (
            format!("Fortnightly Report - {}", date),
            "Please fill in your fortnightly progress report".to_string(),
        ),
        ReportType::Assignment => (
            format!("Monthly Assignment - {}", date),
            "Monthly assignment details to be added by mentor".to_string(),
        ),
        ReportType::FinalEvaluation => (
            "Final Industry Mentor Evaluation".to_string(),
            "Final evaluation by industry mentor".to_string(),
        ),
    }
}
