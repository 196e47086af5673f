//! Time-bucket aggregation: splits a range into fixed-width buckets and counts
//! events per bucket (interval or cumulative), then trims empty stretches.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::common::model::TimeBucket;

/// Upper bound on buckets produced for one series.
pub const MAX_BUCKETS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Events whose timestamp falls inside the bucket.
    Interval,
    /// All events up to the bucket's end boundary.
    Cumulative,
}

/// Bucket width in whole milliseconds; `None` for non-positive or non-finite input.
fn bucket_width(granularity_hours: f64) -> Option<Duration> {
    if !granularity_hours.is_finite() || granularity_hours <= 0.0 {
        return None;
    }
    let millis = (granularity_hours * 3_600_000.0).round();
    if millis < 1.0 || millis > i64::MAX as f64 {
        return None;
    }
    Some(Duration::milliseconds(millis as i64))
}

/// Sub-day buckets carry the time of day; wider buckets only the date.
pub fn format_bucket_label(start: &DateTime<Utc>, granularity_hours: f64) -> String {
    if granularity_hours < 24.0 {
        start.format("%-d %b, %H:%M").to_string()
    } else {
        start.format("%-d %b").to_string()
    }
}

/// Bucket start instants from `start` in steps of `granularity_hours` while
/// before `end`. A zero-length range yields a single bucket at `start`.
pub fn generate_bucket_starts(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity_hours: f64,
) -> Vec<DateTime<Utc>> {
    let Some(width) = bucket_width(granularity_hours) else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }
    if end == start {
        return vec![start];
    }

    let span_ms = (end - start).num_milliseconds();
    let expected = (span_ms as f64 / width.num_milliseconds() as f64).ceil() as usize;
    if expected > MAX_BUCKETS {
        warn!(
            "Refusing to build {} buckets ({}h granularity over {}ms); limit is {}",
            expected, granularity_hours, span_ms, MAX_BUCKETS
        );
        return Vec::new();
    }

    let mut starts = Vec::with_capacity(expected);
    let mut current = start;
    while current < end {
        starts.push(current);
        current += width;
    }
    starts
}

/// Counts events into buckets covering `[start, end]`.
///
/// Interval buckets cover `[bucket_start, bucket_start + width)`; cumulative
/// buckets count every event at or before `bucket_start + width`. Returns an
/// empty series for a non-positive granularity or an inverted range.
pub fn aggregate_by_time(
    events: &[DateTime<Utc>],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity_hours: f64,
    mode: AggregationMode,
) -> Vec<TimeBucket> {
    let Some(width) = bucket_width(granularity_hours) else {
        return Vec::new();
    };

    let mut sorted: Vec<DateTime<Utc>> = events.to_vec();
    sorted.sort_unstable();

    // Number of events strictly before `t`.
    let count_before = |t: DateTime<Utc>| sorted.partition_point(|e| *e < t);
    // Number of events at or before `t`.
    let count_until = |t: DateTime<Utc>| sorted.partition_point(|e| *e <= t);

    generate_bucket_starts(start, end, granularity_hours)
        .into_iter()
        .map(|bucket_start| {
            let bucket_end = bucket_start + width;
            let count = match mode {
                AggregationMode::Interval => count_before(bucket_end) - count_before(bucket_start),
                AggregationMode::Cumulative => count_until(bucket_end),
            };
            TimeBucket {
                start: bucket_start,
                label: format_bucket_label(&bucket_start, granularity_hours),
                count: count as u64,
            }
        })
        .collect()
}

/// Removes uninformative empty buckets: leading and trailing zeros go, as do
/// interior runs of two or more zeros. A single zero between non-zero buckets
/// is kept. Order is preserved.
pub fn trim_consecutive_zeros(buckets: Vec<TimeBucket>) -> Vec<TimeBucket> {
    let Some(first) = buckets.iter().position(|b| b.count != 0) else {
        return Vec::new();
    };
    let last = buckets.iter().rposition(|b| b.count != 0).unwrap_or(first);

    let window = &buckets[first..=last];
    let mut kept = Vec::with_capacity(window.len());
    for (idx, bucket) in window.iter().enumerate() {
        if bucket.count != 0 {
            kept.push(bucket.clone());
            continue;
        }
        let prev_zero = idx > 0 && window[idx - 1].count == 0;
        let next_zero = window.get(idx + 1).map(|b| b.count == 0).unwrap_or(false);
        if !prev_zero && !next_zero {
            kept.push(bucket.clone());
        }
    }
    kept
}

/// Aggregates and trims in one step; the series a chart renders.
pub fn build_series(
    events: &[DateTime<Utc>],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity_hours: f64,
    mode: AggregationMode,
) -> Vec<TimeBucket> {
    trim_consecutive_zeros(aggregate_by_time(events, start, end, granularity_hours, mode))
}
