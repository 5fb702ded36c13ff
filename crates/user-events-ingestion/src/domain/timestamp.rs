//! Flexible timestamp parsing for query parameters.
//!
//! Clients send `from`/`to` in a handful of layouts and sometimes encode them
//! more than once (a space arriving as `%2520`). Values are decoded until
//! stable, trimmed, then tried against each accepted layout in order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use user_events_core::error::TimeParseError;

/// Upper bound on percent-decoding passes.
const MAX_DECODE_PASSES: usize = 3;

/// Zone-less layouts, interpreted as UTC.
const NAIVE_DATETIME_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Parses a possibly percent-encoded timestamp.
///
/// Accepted layouts, first match wins:
///
/// 1. RFC 3339, with or without fractional seconds (`2025-01-01T00:00:00Z`,
///    `2025-01-01T00:00:00.250+02:00`)
/// 2. `YYYY-MM-DD HH:MM:SS[.fff]` (UTC)
/// 3. `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC)
/// 4. `YYYY-MM-DD`, meaning midnight UTC
///
/// `+` is not treated as an encoded space, so an offset such as `+02:00`
/// survives decoding.
///
/// # Errors
///
/// Returns `TimeParseError::Empty` if nothing but whitespace remains after
/// decoding, and `TimeParseError::UnrecognizedFormat` (carrying the raw input)
/// if no layout matches.
pub fn parse_flexible(raw: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let decoded = decode_repeatedly(raw);
    let value = decoded.trim();
    if value.is_empty() {
        return Err(TimeParseError::Empty);
    }

    parse_rfc3339(value)
        .or_else(|| parse_naive_datetime(value))
        .or_else(|| parse_date(value))
        .ok_or_else(|| TimeParseError::UnrecognizedFormat(raw.to_owned()))
}

fn decode_repeatedly(raw: &str) -> String {
    let mut current = raw.to_owned();
    for _ in 0..MAX_DECODE_PASSES {
        let Ok(decoded) = urlencoding::decode(&current) else {
            break;
        };
        if decoded == current {
            break;
        }
        let next = decoded.into_owned();
        current = next;
    }
    current
}

fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_naive_datetime(value: &str) -> Option<DateTime<Utc>> {
    NAIVE_DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .map(|t| t.and_utc())
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, DATE_LAYOUT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}
