use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::analytics::service::time_range_service::{combine_date_time, TimeRangeError};

/// New reporting window. Each bound is either an RFC 3339 instant or a UK
/// date (`DD/MM/YYYY`) with an optional `HH:MM` time; the instant wins when
/// both are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TimeRangeRequest {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,

    #[validate(length(min = 1, max = 10))]
    pub start_date: Option<String>,
    #[validate(length(max = 5))]
    pub start_time: Option<String>,

    #[validate(length(min = 1, max = 10))]
    pub end_date: Option<String>,
    #[validate(length(max = 5))]
    pub end_time: Option<String>,
}

impl TimeRangeRequest {
    /// Both bounds as instants; a bound with neither form is `None`.
    pub fn resolve(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), TimeRangeError> {
        let start = resolve_bound(self.start, self.start_date.as_deref(), self.start_time.as_deref())?;
        let end = resolve_bound(self.end, self.end_date.as_deref(), self.end_time.as_deref())?;
        Ok((start, end))
    }
}

fn resolve_bound(
    instant: Option<DateTime<Utc>>,
    date: Option<&str>,
    time: Option<&str>,
) -> Result<Option<DateTime<Utc>>, TimeRangeError> {
    if instant.is_some() {
        return Ok(instant);
    }
    date.map(|d| combine_date_time(d, time)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn resolves_uk_dates_and_instants() {
        let req = TimeRangeRequest {
            start_date: Some("01/03/2024".into()),
            start_time: Some("09:30".into()),
            end: Some(Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let (start, end) = req.resolve().unwrap();
        assert_eq!(start, Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()));
        assert_eq!(end, Some(Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap()));
    }

    #[test]
    fn missing_bounds_stay_missing_and_bad_dates_fail() {
        assert_eq!(TimeRangeRequest::default().resolve(), Ok((None, None)));

        let bad = TimeRangeRequest { start_date: Some("2024-03-01".into()), ..Default::default() };
        assert!(matches!(bad.resolve(), Err(TimeRangeError::InvalidDate(_))));
    }
}
