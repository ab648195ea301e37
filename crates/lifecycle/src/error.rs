//! Lifecycle error taxonomy.

use internhub_core::{ReportId, StudentId, TransitionError};
use internhub_storage::StorageError;

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Errors surfaced by lifecycle operations.
///
/// None of these are retried inside the lifecycle manager.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Bad input; nothing was changed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing report or student
    #[error("Not found: {0}")]
    NotFound(String),

    /// The student cannot submit until an admin assigns a mentor
    #[error("Student {0} has no assigned mentor")]
    UnassignedMentor(StudentId),

    /// Re-evaluation is disabled and the report already has an evaluation
    #[error("Report {0} is already evaluated")]
    AlreadyEvaluated(ReportId),

    /// The report is not in a status that allows the operation
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Underlying store failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
