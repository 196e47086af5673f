//! Shared domain types (time range, granularity, buckets, chart definitions)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Reporting window applied to every dashboard chart. Always `start <= end`
/// once committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Length of the range in (fractional) days.
    pub fn duration_days(&self) -> f64 {
        self.span().num_milliseconds() as f64 / 86_400_000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GranularityUnit {
    Minutes,
    Hours,
    Days,
}

/// Bucket width as a magnitude and a unit (`15 minutes`, `2 days`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranularitySetting {
    pub magnitude: u32,
    pub unit: GranularityUnit,
}

impl GranularitySetting {
    pub fn new(magnitude: u32, unit: GranularityUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn one_day() -> Self {
        Self::new(1, GranularityUnit::Days)
    }

    pub fn to_hours(&self) -> f64 {
        let magnitude = f64::from(self.magnitude);
        match self.unit {
            GranularityUnit::Minutes => magnitude / 60.0,
            GranularityUnit::Hours => magnitude,
            GranularityUnit::Days => magnitude * 24.0,
        }
    }
}

impl Default for GranularitySetting {
    fn default() -> Self {
        Self::one_day()
    }
}

/// One aggregated interval: `[start, start + width)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub start: DateTime<Utc>,
    pub label: String,
    pub count: u64,
}

/// Dashboard chart: counts documents of `collection` over time by `timestamp_field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDefinition {
    pub id: String,
    pub collection: String,
    pub timestamp_field: String,
    /// Cumulative totals (growth curve) instead of per-interval counts.
    pub cumulative: bool,
}

impl ChartDefinition {
    pub fn new(id: &str, collection: &str, timestamp_field: &str, cumulative: bool) -> Self {
        Self {
            id: id.to_string(),
            collection: collection.to_string(),
            timestamp_field: timestamp_field.to_string(),
            cumulative,
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("user_signups", "users", "dateCreated", false),
            Self::new("total_users", "users", "dateCreated", true),
            Self::new("bookings", "bookings", "createdAt", false),
            Self::new("enquiries", "enquiries", "createdAt", false),
            Self::new("feedback", "feedback", "submittedAt", false),
        ]
    }
}
