//! Date string recognition.

use crate::expression::literal::{date_millis, timestamp_millis};
use chrono::{NaiveDate, NaiveDateTime};
use log::trace;

/// Normalize separators (`/` and `.` become `-`) and strip quote characters
pub fn normalize_date_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .map(|c| if c == '/' || c == '.' { '-' } else { c })
        .collect()
}

/// Parse a date string against `formats` in order and return epoch
/// milliseconds (UTC) for the first format that matches the whole text.
pub fn parse_date_millis(text: &str, formats: &[String]) -> Option<i64> {
    let normalized = normalize_date_text(text);
    if normalized.is_empty() {
        return None;
    }

    for format in formats {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&normalized, format) {
            trace!("'{}' matched date format '{}'", text, format);
            return Some(timestamp_millis(ts));
        }
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, format) {
            trace!("'{}' matched date format '{}'", text, format);
            return date_millis(date);
        }
    }
    None
}
