use serde::Serialize;

use crate::domain::analytics::service::time_bucket_service::AggregationMode;
use crate::domain::common::model::{ChartDefinition, GranularitySetting, GranularityUnit, TimeBucket, TimeRange};

#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    #[serde(flatten)]
    pub chart: ChartDefinition,
    pub granularity: GranularitySetting,
    /// Units selectable under the committed range.
    pub allowed_units: Vec<GranularityUnit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeriesResponse {
    pub chart_id: String,
    pub mode: AggregationMode,
    pub time_range: TimeRange,
    pub granularity: GranularitySetting,
    /// Documents whose timestamp field could not be read as a date.
    pub skipped: usize,
    pub buckets: Vec<TimeBucket>,
}
