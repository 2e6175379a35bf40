use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Timelike};
use serde_json::json;

use crate::error::{AppError, AppResult};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

pub fn parse_datetime(value: &str) -> AppResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|err| {
        AppError::validation_with_details(
            "invalid RFC 3339 timestamp",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn format_datetime(dt: DateTime<FixedOffset>) -> String {
    dt.to_rfc3339()
}

/// Half-open interval intersection; touching endpoints do not overlap.
pub fn overlaps(
    a_start: DateTime<FixedOffset>,
    a_end: DateTime<FixedOffset>,
    b_start: DateTime<FixedOffset>,
    b_end: DateTime<FixedOffset>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// `hour` may be 24, meaning the following midnight. `None` when the instant
/// is outside chrono's range, e.g. for a nonsensical hour.
pub fn at_hour(date: NaiveDate, offset: FixedOffset, hour: u32) -> Option<DateTime<FixedOffset>> {
    let hours = Duration::try_hours(i64::from(hour))?;
    start_of_day(date, offset)?.checked_add_signed(hours)
}

pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    let offset_delta = Duration::try_seconds(i64::from(offset.local_minus_utc()))?;
    let utc = naive.checked_sub_signed(offset_delta)?;
    // Fixed offsets have no gaps or folds, the mapping is always single.
    Some(offset.from_utc_datetime(&utc))
}

pub fn hour_of(dt: DateTime<FixedOffset>) -> u32 {
    dt.hour()
}

pub fn same_day(a: DateTime<FixedOffset>, b: DateTime<FixedOffset>) -> bool {
    a.date_naive() == b.date_naive()
}

/// Whole days from `from` until `until`, rounded up. Zero or negative once
/// `until` has passed.
pub fn days_until(from: DateTime<FixedOffset>, until: DateTime<FixedOffset>) -> i64 {
    let minutes = until.signed_duration_since(from).num_minutes();
    if minutes <= 0 {
        minutes.div_euclid(MINUTES_PER_DAY)
    } else {
        (minutes + MINUTES_PER_DAY - 1) / MINUTES_PER_DAY
    }
}
