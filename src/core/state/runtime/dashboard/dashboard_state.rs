use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::common::model::{GranularitySetting, TimeRange};

/// Days covered by the range a fresh session starts with.
pub const DEFAULT_RANGE_DAYS: i64 = 7;

/// Committed dashboard controls. `time_range` is only ever replaced by a
/// validated range; chart granularities are kept consistent with it.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub time_range: TimeRange,
    pub granularity: HashMap<String, GranularitySetting>,
    pub committed_at: DateTime<Utc>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            time_range: TimeRange::last_days(DEFAULT_RANGE_DAYS),
            granularity: HashMap::new(),
            committed_at: Utc::now(),
        }
    }
}

impl DashboardState {
    /// Setting for `chart_id`; one day when the chart was never configured.
    pub fn granularity_for(&self, chart_id: &str) -> GranularitySetting {
        self.granularity.get(chart_id).copied().unwrap_or_default()
    }
}
