//! Deadline policy.

use chrono::Duration;
use crate::report::ReportType;
use crate::Time;

/// Days between fortnightly reports.
pub const FORTNIGHTLY_PERIOD_DAYS: i64 = 15;

/// Days between assignment reports.
pub const ASSIGNMENT_PERIOD_DAYS: i64 = 30;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Deadline for a report of `kind` anchored at `anchor`.
///
/// Final evaluations are always due at the end of the internship; the anchor
/// is ignored for them.
pub fn deadline(kind: ReportType, anchor: Time, internship_end: Time) -> Time {
    match kind {
        ReportType::Fortnightly => anchor + Duration::days(FORTNIGHTLY_PERIOD_DAYS),
        ReportType::Assignment => anchor + Duration::days(ASSIGNMENT_PERIOD_DAYS),
        ReportType::FinalEvaluation => internship_end,
    }
}

/// Whole days from `from` to `to`, rounded toward negative infinity.
pub fn whole_days_between(from: Time, to: Time) -> i64 {
    (to - from).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}
