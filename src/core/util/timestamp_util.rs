use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::core::store::document::{FieldMap, FieldValue};

/// Fixed display format for normalized timestamps (UTC).
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct TimestampUtil;

impl TimestampUtil {
    #[inline]
    fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
        if !seconds.is_finite() {
            return None;
        }
        Utc.timestamp_millis_opt((seconds * 1000.0).trunc() as i64).single()
    }

    #[inline]
    fn from_epoch_millis(millis: f64) -> Option<DateTime<Utc>> {
        if !millis.is_finite() {
            return None;
        }
        Utc.timestamp_millis_opt(millis.trunc() as i64).single()
    }

    /// Numeric `seconds` (or `_seconds`) carried by a serialized timestamp map.
    #[inline]
    fn map_epoch_seconds(map: &FieldMap) -> Option<f64> {
        map.get("seconds")
            .or_else(|| map.get("_seconds"))
            .and_then(FieldValue::as_f64)
    }

    /// Whether the value is one of the timestamp shapes the normalizer rewrites:
    /// a store timestamp, a native date, or a map with numeric epoch seconds.
    /// Strings are never timestamp-like, which keeps normalization idempotent.
    pub fn is_timestamp_like(value: &FieldValue) -> bool {
        match value {
            FieldValue::Timestamp(_) | FieldValue::Date(_) => true,
            FieldValue::Map(map) => Self::map_epoch_seconds(map).is_some(),
            _ => false,
        }
    }

    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and plain dates.
    pub fn parse_date_string(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in [DISPLAY_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Converts any supported timestamp representation to a date.
    ///
    /// Precedence: epoch-seconds field, then native date, then generic parsing
    /// (strings and epoch milliseconds). Empty values yield `None`.
    pub fn to_date(value: &FieldValue) -> Option<DateTime<Utc>> {
        match value {
            FieldValue::Timestamp(ts) => Self::from_epoch_seconds(ts.seconds as f64),
            FieldValue::Map(map) => Self::map_epoch_seconds(map).and_then(Self::from_epoch_seconds),
            FieldValue::Date(date) => Some(*date),
            FieldValue::String(s) if !s.is_empty() => Self::parse_date_string(s),
            FieldValue::Integer(ms) if *ms != 0 => Self::from_epoch_millis(*ms as f64),
            FieldValue::Double(ms) if *ms != 0.0 => Self::from_epoch_millis(*ms),
            _ => None,
        }
    }

    /// [`Self::to_date`] with a fallback for absent or unparseable input.
    #[inline]
    pub fn to_date_or(value: Option<&FieldValue>, fallback: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        value.and_then(Self::to_date).or(fallback)
    }

    #[inline]
    pub fn format_date_time(date: &DateTime<Utc>) -> String {
        date.format(DISPLAY_FORMAT).to_string()
    }

    /// Display string for a timestamp-like value; empty when it cannot be converted.
    pub fn format_value(value: &FieldValue) -> String {
        Self::to_date(value)
            .map(|d| Self::format_date_time(&d))
            .unwrap_or_default()
    }

    /// Converts the named fields of a record to native dates (or `Null` when
    /// they cannot be converted and no fallback is given). Absent fields stay absent.
    pub fn convert_fields(
        fields: &FieldMap,
        names: &[&str],
        fallback: Option<DateTime<Utc>>,
    ) -> FieldMap {
        let mut converted = fields.clone();
        for name in names {
            if let Some(value) = converted.get_mut(*name) {
                *value = Self::to_date_or(Some(&*value), fallback)
                    .map(FieldValue::Date)
                    .unwrap_or(FieldValue::Null);
            }
        }
        converted
    }
}
