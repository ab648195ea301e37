//! Notification model.

use serde::{Deserialize, Serialize};
use crate::id::NotificationId;
use crate::Time;

/// A notification addressed to a student, mentor or admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique identifier
    pub id: NotificationId,

    /// Recipient identifier
    pub recipient: String,

    /// What kind of user the recipient is
    pub recipient_kind: RecipientKind,

    /// Notification type
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    /// Short title
    pub title: String,

    /// Message body
    pub message: String,

    /// Whether the recipient has seen it
    #[serde(default)]
    pub read: bool,

    /// When created
    pub created_at: Time,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(
        recipient: impl Into<String>,
        recipient_kind: RecipientKind,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new_at(recipient, recipient_kind, kind, title, message, chrono::Utc::now())
    }

    /// Create an unread notification dated `created_at`.
    pub fn new_at(
        recipient: impl Into<String>,
        recipient_kind: RecipientKind,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: Time,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient: recipient.into(),
            recipient_kind,
            kind,
            title: title.into(),
            message: message.into(),
            read: false,
            created_at,
        }
    }
}

/// Kind of user receiving a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipientKind {
    /// A student
    Student,
    /// A mentor
    Mentor,
    /// An admin
    Admin,
}

impl std::str::FromStr for RecipientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(RecipientKind::Student),
            "mentor" => Ok(RecipientKind::Mentor),
            "admin" => Ok(RecipientKind::Admin),
            other => Err(format!("unknown recipient kind: {other}")),
        }
    }
}

/// Notification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// A student submitted a report
    ReportSubmitted,
    /// A mentor evaluated a report
    ReportEvaluated,
    /// The scheduler created a new report to fill in
    ReportDue,
    /// A report went overdue
    DeadlineReminder,
}
