//! Storage trait abstraction.

use async_trait::async_trait;
use internhub_core::{
    ActiveStudent, MentorId, Notification, NotificationId, RecipientKind, Report, ReportId,
    ReportStatus, ReportType, Student, StudentId, Time,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Report query. Every set field must match.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Owning student
    pub student: Option<StudentId>,
    /// Responsible mentor
    pub mentor: Option<MentorId>,
    /// Allowed statuses
    pub statuses: Option<Vec<ReportStatus>>,
    /// Report type
    pub kind: Option<ReportType>,
    /// Deadline strictly before this instant
    pub deadline_before: Option<Time>,
}

impl ReportFilter {
    /// Reports owned by `student`.
    pub fn for_student(student: StudentId) -> Self {
        Self {
            student: Some(student),
            ..Default::default()
        }
    }

    /// Reports assigned to `mentor`.
    pub fn for_mentor(mentor: MentorId) -> Self {
        Self {
            mentor: Some(mentor),
            ..Default::default()
        }
    }

    /// Whether `report` satisfies the filter.
    pub fn matches(&self, report: &Report) -> bool {
        if self.student.is_some_and(|s| s != report.student) {
            return false;
        }
        if self.mentor.is_some_and(|m| m != report.mentor) {
            return false;
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&report.status) {
                return false;
            }
        }
        if self.kind.is_some_and(|k| k != report.kind) {
            return false;
        }
        if self.deadline_before.is_some_and(|t| report.deadline >= t) {
            return false;
        }
        true
    }
}

/// Storage abstraction for InternHub data.
///
/// Receivers are shared references so one store can serve request handlers
/// and the scheduler at the same time. Each save replaces a whole document;
/// there are no multi-document transactions.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Report operations ===

    /// Save a report (create or update).
    async fn save_report(&self, report: &Report) -> Result<()>;

    /// Load a report by ID.
    async fn load_report(&self, id: ReportId) -> Result<Option<Report>>;

    /// List reports matching the filter.
    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>>;

    /// Delete a report.
    async fn delete_report(&self, id: ReportId) -> Result<()>;

    // === Student operations ===

    /// Save a student (create or update).
    async fn save_student(&self, student: &Student) -> Result<()>;

    /// Load a student by ID.
    async fn load_student(&self, id: StudentId) -> Result<Option<Student>>;

    /// List all students.
    async fn list_students(&self) -> Result<Vec<Student>>;

    /// Students with an approved internship that has not ended at `now`.
    async fn find_active_students(&self, now: Time) -> Result<Vec<ActiveStudent>> {
        Ok(self
            .list_students()
            .await?
            .iter()
            .filter(|s| s.is_active(now))
            .map(ActiveStudent::from)
            .collect())
    }

    /// Mentor assigned to a student; `None` if unassigned or unknown.
    async fn assigned_mentor(&self, student: StudentId) -> Result<Option<MentorId>> {
        Ok(self
            .load_student(student)
            .await?
            .and_then(|s| s.internal_mentor))
    }

    // === Notification operations ===

    /// Save a notification (create or update).
    async fn save_notification(&self, notification: &Notification) -> Result<()>;

    /// Load a notification by ID.
    async fn load_notification(&self, id: NotificationId) -> Result<Option<Notification>>;

    /// Notifications for a recipient, newest first, at most `limit`.
    async fn list_notifications(
        &self,
        recipient: &str,
        kind: RecipientKind,
        limit: usize,
    ) -> Result<Vec<Notification>>;
}
