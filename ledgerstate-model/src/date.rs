//! Date fields.
//!
//! Dates cross the store boundary as text in one fixed UTC format,
//! `yyyy-MM-ddTHH:mm:ssZ`, with second precision.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// `strftime` pattern of the stored date format.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Formats a date in the stored format.
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats a date as a JSON field value.
#[must_use]
pub fn date_value(date: &DateTime<Utc>) -> Value {
    Value::String(format_date(date))
}

/// Parses a stored date. Any RFC 3339 timestamp is accepted as well.
#[must_use]
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

