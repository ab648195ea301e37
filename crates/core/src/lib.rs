//! InternHub core data models.
//!
//! This crate defines the report, student and notification records that the
//! lifecycle manager and the daily scheduler operate on, together with the
//! deadline policy.

#![warn(missing_docs)]

// Core identities
mod id;

// Reports and their deadlines
mod report;
mod deadline;

// Students and notifications
mod student;
mod notification;

// Re-exports
pub use id::*;

pub use report::{
    Attachment, Evaluation, Report, ReportStatus, ReportType, TransitionError, MAX_POINTS,
};
pub use deadline::{deadline, whole_days_between, ASSIGNMENT_PERIOD_DAYS, FORTNIGHTLY_PERIOD_DAYS};
pub use student::{ActiveStudent, InternshipDetails, InternshipStatus, Student, StudentProgress};
pub use notification::{Notification, NotificationKind, RecipientKind};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
