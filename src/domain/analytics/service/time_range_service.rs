use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use crate::domain::common::model::TimeRange;

/// Earliest year accepted for a reporting range.
pub const MIN_YEAR: i32 = 2023;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("Cannot apply changes: start and end dates are required")]
    Missing,

    #[error("Invalid date '{0}': expected DD/MM/YYYY")]
    InvalidDate(String),

    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTime(String),

    #[error("Please enter dates from {} onwards", MIN_YEAR)]
    BeforeMinYear,

    #[error("Start date must be before end date")]
    StartAfterEnd,
}

/// Parses a UK-format date (`DD/MM/YYYY`).
pub fn parse_date_input(raw: &str) -> Result<NaiveDate, TimeRangeError> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y")
        .map_err(|_| TimeRangeError::InvalidDate(raw.to_string()))
}

/// Parses a 24h time (`HH:MM`).
pub fn parse_time_input(raw: &str) -> Result<NaiveTime, TimeRangeError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| TimeRangeError::InvalidTime(raw.to_string()))
}

/// Combines UK date/time inputs into a UTC instant. A missing time means midnight.
pub fn combine_date_time(date: &str, time: Option<&str>) -> Result<DateTime<Utc>, TimeRangeError> {
    let date = parse_date_input(date)?;
    let time = match time {
        Some(t) if !t.trim().is_empty() => parse_time_input(t)?,
        _ => NaiveTime::MIN,
    };
    Ok(date.and_time(time).and_utc())
}

/// Validates a candidate range. Both ends are required, neither may precede
/// [`MIN_YEAR`], and `start <= end`.
pub fn validate_time_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<TimeRange, TimeRangeError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(TimeRangeError::Missing);
    };

    if start.year() < MIN_YEAR || end.year() < MIN_YEAR {
        return Err(TimeRangeError::BeforeMinYear);
    }

    if start > end {
        return Err(TimeRangeError::StartAfterEnd);
    }

    Ok(TimeRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_ordered_and_equal_bounds() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(validate_time_range(Some(a), Some(b)), Ok(TimeRange { start: a, end: b }));
        assert!(validate_time_range(Some(a), Some(a)).is_ok());
    }

    #[test]
    fn rejects_inverted_old_and_missing_ranges() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2022, 12, 31, 0, 0, 0).unwrap();

        let err = validate_time_range(Some(b), Some(a)).unwrap_err();
        assert_eq!(err.to_string(), "Start date must be before end date");
        assert_eq!(validate_time_range(Some(old), Some(b)), Err(TimeRangeError::BeforeMinYear));
        assert_eq!(validate_time_range(None, Some(b)), Err(TimeRangeError::Missing));
    }

    #[test]
    fn combines_uk_inputs() {
        let dt = combine_date_time("15/01/2024", Some("14:30")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap());

        let midnight = combine_date_time("01/02/2024", None).unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

        assert!(matches!(combine_date_time("2024-01-15", None), Err(TimeRangeError::InvalidDate(_))));
        assert!(matches!(combine_date_time("15/01/2024", Some("25:00")), Err(TimeRangeError::InvalidTime(_))));
    }
}
