/// Small helpers shared by the source adapters and the exporters.
///
/// IMPORTANT:
/// - No source-specific or format-specific logic lives here.
/// - Everything in this module is pure and deterministic.
///

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Maximum number of characters kept from an error body.
pub const SNIPPET_LEN: usize = 200;

/// Truncate a response body for inclusion in an error message.
///
/// Truncation is character based, so multi-byte text is never split.
pub fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_LEN).collect()
}

/// Normalize a profile identifier as typed by a user.
///
/// Examples:
/// - "  alice "  -> "alice"
/// - "@alice"    -> "alice"
///
pub fn normalize_subject(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_string()
}

/// Convert Unix seconds into a UTC timestamp.
///
/// Returns `None` for values chrono cannot represent.
pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// First instant of a calendar day, in UTC.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last representable instant of a calendar day, in UTC.
///
/// Used for the upper bound of a date filter so a whole end day is included.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last))
}

/// Resolve the offset used to display timestamps.
///
/// `None` falls back to the machine's current local offset.
pub fn display_offset(offset_minutes: Option<i32>) -> FixedOffset {
    offset_minutes
        .and_then(|m| FixedOffset::east_opt(m * 60))
        .unwrap_or_else(|| *Local::now().offset())
}

/// Format a timestamp as `HH:MM:SS DD/MM/YYYY` in the given offset.
pub fn format_timestamp(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset)
        .format("%H:%M:%S %d/%m/%Y")
        .to_string()
}
