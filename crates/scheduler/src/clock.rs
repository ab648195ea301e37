//! Fire-time arithmetic.

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use internhub_core::Time;

/// The first instant strictly after `now` whose UTC wall-clock time is `fire_at`.
pub fn next_fire_after(now: Time, fire_at: NaiveTime) -> Time {
    let today = Utc.from_utc_datetime(&now.date_naive().and_time(fire_at));
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
