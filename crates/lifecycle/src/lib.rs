//! Report lifecycle (Layer 2)
//!
//! Report creation, submission, evaluation, the overdue sweep and the
//! per-student progress aggregate.

#![warn(missing_docs)]

pub mod error;
pub mod manager;
pub mod analytics;

pub use error::{LifecycleError, Result};
pub use manager::{LifecycleConfig, MentorReports, ReportLifecycleManager, SubmitReport};
pub use analytics::{AnalyticsScope, AnalyticsSummary, ReportTypeCounts};
