//! Maturity timestamp handling
//!
//! The marketplace renders maturity as e.g. `"Jan 01, 2026 00:00 UTC"`.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format of the date part, without the trailing zone abbreviation
const MATURITY_FORMAT: &str = "%b %d, %Y %H:%M";

/// Display format used in reports (e.g. `Thu 01 Jan 2026`)
const DISPLAY_FORMAT: &str = "%a %d %b %Y";

const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a maturity timestamp. The zone abbreviation must be alphabetic and is read as UTC.
pub fn parse_maturity(raw: &str) -> Option<DateTime<Utc>> {
    let (date_part, zone) = raw.trim().rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    NaiveDateTime::parse_from_str(date_part.trim(), MATURITY_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whole days from `now` until `maturity`, floored
pub fn days_until(maturity: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (maturity - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub fn format_maturity(maturity: DateTime<Utc>) -> String {
    maturity.format(DISPLAY_FORMAT).to_string()
}
