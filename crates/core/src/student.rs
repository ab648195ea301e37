//! Student model - internship details, mentor assignment and progress.

use serde::{Deserialize, Serialize};
use crate::id::{MentorId, StudentId};
use crate::Time;

/// A student doing an internship.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Unique identifier
    pub id: StudentId,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Contact email
    pub email: String,

    /// Internship information, filled in by an admin
    pub internship: InternshipDetails,

    /// Internal mentor, assigned by an admin
    pub internal_mentor: Option<MentorId>,

    /// Denormalized report progress
    #[serde(default)]
    pub progress: StudentProgress,
}

impl Student {
    /// Whether the scheduler should generate reports for this student at `now`.
    pub fn is_active(&self, now: Time) -> bool {
        self.internship.status == InternshipStatus::Approved && self.internship.end_date > now
    }

    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Internship details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternshipDetails {
    /// Host company
    pub company_name: String,

    /// First day of the internship
    pub start_date: Time,

    /// Last day of the internship
    pub end_date: Time,

    /// Approval status
    #[serde(default)]
    pub status: InternshipStatus,
}

/// Internship approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InternshipStatus {
    /// Waiting for admin approval
    #[default]
    Pending,
    /// Approved and running
    Approved,
    /// Finished
    Completed,
}

/// Report completion aggregate stored on the student.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    /// All reports owned by the student
    pub total_reports: usize,

    /// Reports in EVALUATED status
    pub completed_reports: usize,

    /// Percentage complete (0-100)
    pub overall_completion_percentage: f32,
}

impl StudentProgress {
    /// Build the aggregate from raw counts. Zero reports means zero percent.
    pub fn from_counts(total_reports: usize, completed_reports: usize) -> Self {
        let overall_completion_percentage = if total_reports > 0 {
            (completed_reports as f32 / total_reports as f32) * 100.0
        } else {
            0.0
        };

        Self {
            total_reports,
            completed_reports,
            overall_completion_percentage,
        }
    }
}

/// Directory view of a student the scheduler works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStudent {
    /// Student identifier
    pub id: StudentId,
    /// Internship start
    pub internship_start: Time,
    /// Internship end
    pub internship_end: Time,
    /// Assigned mentor, if any
    pub mentor_id: Option<MentorId>,
}

impl From<&Student> for ActiveStudent {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            internship_start: student.internship.start_date,
            internship_end: student.internship.end_date,
            mentor_id: student.internal_mentor,
        }
    }
}
