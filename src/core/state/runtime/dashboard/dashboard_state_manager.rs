use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::core::state::runtime::dashboard::dashboard_state::DashboardState;
use crate::core::state::runtime::dashboard::dashboard_state_repository_trait::DashboardStateRepositoryTrait;
use crate::domain::analytics::service::granularity_service::coerce_for_range;
use crate::domain::analytics::service::time_range_service::{validate_time_range, TimeRangeError};
use crate::domain::common::model::{GranularitySetting, TimeRange};

pub struct DashboardStateManager<R: DashboardStateRepositoryTrait> {
    pub(crate) repo: Arc<R>,
}

impl<R: DashboardStateRepositoryTrait> DashboardStateManager<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn snapshot(&self) -> Arc<DashboardState> {
        self.repo.get().await
    }

    pub async fn time_range(&self) -> TimeRange {
        self.repo.get().await.time_range
    }

    pub async fn granularity(&self, chart_id: &str) -> GranularitySetting {
        self.repo.get().await.granularity_for(chart_id)
    }

    /// Validates and applies a new range, then re-coerces every chart
    /// granularity against it. A rejected range leaves the state untouched.
    pub async fn commit_time_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<TimeRange, TimeRangeError> {
        let range = match validate_time_range(start, end) {
            Ok(range) => range,
            Err(err) => {
                warn!(error = %err, "Rejected time range");
                return Err(err);
            }
        };

        self.repo
            .update(move |state| {
                state.time_range = range;
                state.committed_at = Utc::now();
                for setting in state.granularity.values_mut() {
                    *setting = coerce_for_range(*setting, &range);
                }
            })
            .await;

        info!(start = %range.start, end = %range.end, "Time range committed");
        Ok(range)
    }

    /// Stores the setting for one chart, coerced against the committed range.
    pub async fn set_chart_granularity(
        &self,
        chart_id: &str,
        setting: GranularitySetting,
    ) -> GranularitySetting {
        let id = chart_id.to_string();
        self.repo
            .update(move |state| {
                let coerced = coerce_for_range(setting, &state.time_range);
                state.granularity.insert(id, coerced);
            })
            .await;
        self.granularity(chart_id).await
    }
}
