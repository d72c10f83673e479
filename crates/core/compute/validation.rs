//! Validation of incoming queries and ISO-8601 time parsing.

use crate::error::{FederationError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use twinfed_types::query::SpaceQuery;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Inclusive query window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_millis: i64,
    pub end_millis: i64,
}

impl TimeWindow {
    pub fn new(start_millis: i64, end_millis: i64) -> Result<Self> {
        if start_millis > end_millis {
            return Err(FederationError::InvalidInput(format!(
                "start ({}) is after end ({})",
                start_millis, end_millis
            )));
        }
        Ok(Self {
            start_millis,
            end_millis,
        })
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        (self.start_millis..=self.end_millis).contains(&timestamp)
    }
}

/// A query whose fields are present and whose window parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub space: String,
    pub window: TimeWindow,
}

/// Parses an ISO-8601 string into epoch milliseconds.
///
/// Accepts RFC 3339 (`Z` or numeric offset), naive date-times which are read
/// as UTC, and plain dates which map to midnight UTC.
///
/// # Examples
///
/// ```
/// use twinfed::compute::validation::parse_iso_millis;
///
/// assert_eq!(parse_iso_millis("1970-01-01T00:00:01Z").unwrap(), 1000);
/// assert_eq!(parse_iso_millis("1970-01-01T01:00:00+01:00").unwrap(), 0);
/// assert_eq!(parse_iso_millis("1970-01-02").unwrap(), 86_400_000);
/// assert!(parse_iso_millis("yesterday").is_err());
/// ```
pub fn parse_iso_millis(value: &str) -> Result<i64> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp_millis());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        && let Some(dt) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(dt.and_utc().timestamp_millis());
    }

    Err(FederationError::InvalidInput(format!(
        "not an ISO-8601 date-time: '{}'",
        value
    )))
}

/// Parses a start/end pair into a window.
pub fn parse_window(start: &str, end: &str) -> Result<TimeWindow> {
    let start_millis = parse_iso_millis(start)
        .map_err(|e| FederationError::InvalidInput(format!("startDate: {}", inner_message(e))))?;
    let end_millis = parse_iso_millis(end)
        .map_err(|e| FederationError::InvalidInput(format!("endDate: {}", inner_message(e))))?;
    TimeWindow::new(start_millis, end_millis)
}

/// Checks that every required field is present and parses the window.
pub fn validate_query(query: &SpaceQuery) -> Result<ValidatedQuery> {
    let space = required(query.space.as_deref(), "space")?;
    let start = required(query.start_date.as_deref(), "startDate")?;
    let end = required(query.end_date.as_deref(), "endDate")?;

    Ok(ValidatedQuery {
        space: space.to_string(),
        window: parse_window(start, end)?,
    })
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(FederationError::InvalidInput(format!(
            "'{}' is required",
            field
        ))),
    }
}

fn inner_message(e: FederationError) -> String {
    match e {
        FederationError::InvalidInput(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_variants() {
        let z = parse_iso_millis("2025-06-15T00:39:44.458Z").unwrap();
        assert_eq!(z, 1749947984458);

        let offset = parse_iso_millis("2025-06-15T10:39:44.458+10:00").unwrap();
        assert_eq!(offset, z);
    }

    #[test]
    fn test_parse_naive_is_utc() {
        assert_eq!(
            parse_iso_millis("2025-06-15T00:39:44.458").unwrap(),
            1749947984458
        );
        assert_eq!(parse_iso_millis("1970-01-01T00:01").unwrap(), 60_000);
        assert_eq!(parse_iso_millis("1970-01-01 00:00:02").unwrap(), 2_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "2025-13-01", "15/06/2025", "now"] {
            let err = parse_iso_millis(bad).unwrap_err();
            assert_eq!(err.status_code(), 400, "{}", bad);
        }
    }

    #[test]
    fn test_window_order() {
        assert!(parse_window("2025-06-15", "2025-06-16").is_ok());
        assert!(parse_window("2025-06-15", "2025-06-15").is_ok());

        let err = parse_window("2025-06-16", "2025-06-15").unwrap_err();
        assert!(matches!(err, FederationError::InvalidInput(_)));
    }

    #[test]
    fn test_window_error_names_field() {
        let err = parse_window("2025-06-15", "tomorrow").unwrap_err();
        assert!(err.to_string().contains("endDate"));
    }

    #[test]
    fn test_validate_query_missing_fields() {
        let query = SpaceQuery {
            space: Some("House".into()),
            start_date: None,
            end_date: Some("2025-06-16".into()),
        };
        let err = validate_query(&query).unwrap_err();
        assert!(err.to_string().contains("startDate"));

        let blank = SpaceQuery::new("  ", "2025-06-15", "2025-06-16");
        assert!(validate_query(&blank).is_err());
    }

    #[test]
    fn test_validate_query_ok() {
        let query = SpaceQuery::new("House", "1970-01-01T00:00:00Z", "1970-01-01T00:00:01Z");
        let validated = validate_query(&query).unwrap();
        assert_eq!(validated.space, "House");
        assert_eq!(validated.window, TimeWindow::new(0, 1000).unwrap());
        assert!(validated.window.contains(1000));
        assert!(!validated.window.contains(1001));
    }
}
