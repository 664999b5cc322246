//! Timestamp parsing and formatting.
//!
//! Documents store timestamps as ISO 8601 strings written by whichever
//! client created them. Parsing is lenient in the same shapes a browser
//! `Date` accepts for those writers; anything else is treated as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

pub type Timestamp = DateTime<Utc>;

/// Format as `YYYY-MM-DDTHH:MM:SS.sssZ`, the shape every writer in this
/// system produces.
pub fn to_iso_string(ts: Timestamp) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO 8601 timestamp string.
///
/// Accepts RFC 3339 with any offset, an offset-less date-time (read as UTC),
/// or a bare `YYYY-MM-DD` date (UTC midnight).
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
  let s = raw.trim();
  if s.is_empty() {
    return None;
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }

  for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }

  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Parse a JSON field value as a timestamp.
///
/// Strings go through [`parse_timestamp`]; numbers are epoch milliseconds.
pub fn parse_timestamp_value(value: &Value) -> Option<Timestamp> {
  match value {
    Value::String(s) => parse_timestamp(s),
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().map(|f| f as i64))
      .and_then(DateTime::from_timestamp_millis),
    _ => None,
  }
}
