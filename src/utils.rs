use crate::weather_data::error::InvalidRangeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const MAX_BODY_CHARS: usize = 500;

/// Parses a `YYYY-MM-DD` date, naming the offending field on failure.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, InvalidRangeError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|source| {
        InvalidRangeError::Unparseable {
            field,
            value: value.to_string(),
            source,
        }
    })
}

/// Parses a provider timestamp into naive UTC.
///
/// Accepts `YYYY-MM-DDTHH:MM`, `YYYY-MM-DDTHH:MM:SS[.f]` and RFC 3339 with a `Z` or
/// `±HH:MM` offset. Offset-carrying values are converted to UTC; the rest are taken
/// as already being in the response's timezone.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Shortens a response body for inclusion in error messages.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
