//! Shared utility functions used across multiple modules.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike};

/// Format of every entry timestamp, local time at second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Parse an entry timestamp (`YYYY-MM-DD HH:MM:SS`).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Format a local date-time as an entry timestamp.
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time truncated to the second, as a naive date-time.
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Epoch seconds of a naive date-time interpreted in the local time zone.
///
/// Ambiguous local times (DST fall-back) resolve to the earliest instant.
/// Returns `None` for local times that do not exist (DST spring-forward gap).
pub fn local_epoch_seconds(value: &NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(value)
        .earliest()
        .map(|instant| instant.timestamp())
}

/// Local naive date-time of an epoch timestamp in seconds.
pub fn local_from_epoch_seconds(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(&Local).naive_local())
}

/// Current Unix timestamp in seconds.
pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}
