//! Calendar-day arithmetic. Every function takes "today" explicitly.

use chrono::{Duration, NaiveDate};

/// Signed number of days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// `date` shifted by `days`, or `None` when the result leaves chrono's
/// representable range.
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// Days remaining until `target`; negative once it has passed.
pub fn days_until(target: NaiveDate, today: NaiveDate) -> i64 {
    days_between(today, target)
}

/// Whether `today` falls inside `[start, end]`, both ends inclusive.
pub fn is_within_window(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> bool {
    start <= today && today <= end
}
