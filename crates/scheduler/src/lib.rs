//! Daily scheduler - due-report generation and the overdue sweep.

#![warn(missing_docs)]

pub mod clock;
pub mod daily;

pub use clock::next_fire_after;
pub use daily::{DailyScheduler, SchedulerConfig, TickFailure, TickOutcome, TickReport};
