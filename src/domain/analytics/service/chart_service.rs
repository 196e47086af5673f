use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};
use validator::Validate;

use crate::core::state::runtime::dashboard::dashboard_state_manager::DashboardStateManager;
use crate::core::state::runtime::dashboard::dashboard_state_repository_trait::DashboardStateRepositoryTrait;
use crate::core::store::document_store_trait::DocumentStore;
use crate::core::store::reference::CollectionRef;
use crate::core::util::timestamp_util::TimestampUtil;
use crate::domain::analytics::dto::chart_response::{ChartSeriesResponse, ChartView};
use crate::domain::analytics::dto::granularity_request::GranularityRequest;
use crate::domain::analytics::dto::time_range_request::TimeRangeRequest;
use crate::domain::analytics::service::granularity_service::allowed_units;
use crate::domain::analytics::service::time_bucket_service::{build_series, AggregationMode};
use crate::domain::common::model::{ChartDefinition, TimeRange};
use crate::errors::AppError;

/// Dashboard charts: committed range, per-chart granularity, and the
/// aggregated series read from the store.
pub struct ChartService<R: DashboardStateRepositoryTrait> {
    store: Arc<dyn DocumentStore>,
    dashboard: Arc<DashboardStateManager<R>>,
    charts: Vec<ChartDefinition>,
}

impl<R: DashboardStateRepositoryTrait> ChartService<R> {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        dashboard: Arc<DashboardStateManager<R>>,
        charts: Vec<ChartDefinition>,
    ) -> Self {
        Self { store, dashboard, charts }
    }

    pub async fn time_range(&self) -> Result<TimeRange> {
        Ok(self.dashboard.time_range().await)
    }

    /// A rejected range surfaces as an error and the committed one stays.
    pub async fn commit_time_range(&self, req: TimeRangeRequest) -> Result<TimeRange> {
        req.validate()?;
        let (start, end) = req.resolve()?;
        Ok(self.dashboard.commit_time_range(start, end).await?)
    }

    pub async fn list_charts(&self) -> Result<Vec<ChartView>> {
        let state = self.dashboard.snapshot().await;
        let units = allowed_units(&state.time_range);
        Ok(self
            .charts
            .iter()
            .map(|chart| ChartView {
                chart: chart.clone(),
                granularity: state.granularity_for(&chart.id),
                allowed_units: units.clone(),
            })
            .collect())
    }

    pub async fn set_granularity(&self, chart_id: &str, req: GranularityRequest) -> Result<ChartView> {
        req.validate()?;
        let chart = self.chart(chart_id)?.clone();

        let granularity = self.dashboard.set_chart_granularity(chart_id, req.into()).await;
        info!(chart = chart_id, magnitude = granularity.magnitude, unit = ?granularity.unit, "Chart granularity set");

        let range = self.dashboard.time_range().await;
        Ok(ChartView {
            chart,
            granularity,
            allowed_units: allowed_units(&range),
        })
    }

    /// Reads the chart's collection and buckets its timestamp field over the
    /// committed range. Documents without a readable date are skipped.
    pub async fn series(&self, chart_id: &str) -> Result<ChartSeriesResponse> {
        let chart = self.chart(chart_id)?;
        let state = self.dashboard.snapshot().await;
        let granularity = state.granularity_for(&chart.id);
        let range = state.time_range;

        let collection = CollectionRef::new(&chart.collection)?;
        let documents = self
            .store
            .get_all(&collection, &[])
            .await
            .with_context(|| format!("failed to read '{}' for chart {}", chart.collection, chart.id))?;

        let events: Vec<_> = documents
            .iter()
            .filter_map(|doc| TimestampUtil::to_date_or(doc.get_field(&chart.timestamp_field), None))
            .collect();
        let skipped = documents.len() - events.len();

        let mode = if chart.cumulative {
            AggregationMode::Cumulative
        } else {
            AggregationMode::Interval
        };
        let buckets = build_series(&events, range.start, range.end, granularity.to_hours(), mode);
        debug!(chart = chart_id, events = events.len(), skipped, buckets = buckets.len(), "Chart series built");

        Ok(ChartSeriesResponse {
            chart_id: chart.id.clone(),
            mode,
            time_range: range,
            granularity,
            skipped,
            buckets,
        })
    }

    fn chart(&self, chart_id: &str) -> Result<&ChartDefinition> {
        self.charts
            .iter()
            .find(|c| c.id == chart_id)
            .ok_or_else(|| AppError::NotFound(format!("chart {chart_id}")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::dashboard::dashboard_state_repository::DashboardStateRepository;
    use crate::core::store::document::FieldValue;
    use crate::core::store::memory_store::InMemoryDocumentStore;
    use crate::domain::analytics::service::time_range_service::TimeRangeError;
    use crate::domain::common::model::GranularityUnit;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn service() -> ChartService<DashboardStateRepository> {
        let store = InMemoryDocumentStore::new();
        let users = CollectionRef::new("users").unwrap();
        let docs = [
            ("a", json!({ "dateCreated": { "seconds": 1_717_200_000, "nanoseconds": 0 } })), // 1 Jun 00:00
            ("b", json!({ "dateCreated": "2024-06-01T05:00:00Z" })),
            ("c", json!({ "dateCreated": "2024-06-03T10:00:00Z" })),
            ("d", json!({ "name": "no date" })),
        ];
        for (id, body) in docs {
            let FieldValue::Map(fields) = FieldValue::from(body) else {
                unreachable!()
            };
            store.insert(&users, id, fields).unwrap();
        }
        let dashboard = Arc::new(DashboardStateManager::new(DashboardStateRepository::new().shared()));
        ChartService::new(Arc::new(store), dashboard, ChartDefinition::defaults())
    }

    fn june_range() -> TimeRangeRequest {
        TimeRangeRequest {
            start: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn interval_and_cumulative_series() {
        let service = service();
        service.commit_time_range(june_range()).await.unwrap();

        let signups = service.series("user_signups").await.unwrap();
        assert_eq!(signups.skipped, 1);
        let counts: Vec<u64> = signups.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 0, 1]);
        assert_eq!(signups.buckets[0].label, "1 Jun");

        let total = service.series("total_users").await.unwrap();
        let counts: Vec<u64> = total.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2, 3]);
    }

    #[tokio::test]
    async fn granularity_is_coerced_for_long_ranges() {
        let service = service();
        service.commit_time_range(june_range()).await.unwrap();

        let view = service
            .set_granularity(
                "bookings",
                GranularityRequest { magnitude: 90, unit: GranularityUnit::Minutes },
            )
            .await
            .unwrap();
        assert_eq!(view.granularity.unit, GranularityUnit::Days);
        assert_eq!(view.allowed_units, vec![GranularityUnit::Days]);

        let zero = GranularityRequest { magnitude: 0, unit: GranularityUnit::Hours };
        assert!(service.set_granularity("bookings", zero).await.is_err());
    }

    #[tokio::test]
    async fn invalid_requests_leave_state_alone() {
        let service = service();
        let before = service.commit_time_range(june_range()).await.unwrap();

        let inverted = TimeRangeRequest {
            start: june_range().end,
            end: june_range().start,
            ..Default::default()
        };
        let err = service.commit_time_range(inverted).await.unwrap_err();
        assert_eq!(err.downcast_ref::<TimeRangeError>(), Some(&TimeRangeError::StartAfterEnd));
        assert_eq!(service.time_range().await.unwrap(), before);

        let missing = service.series("nope").await.unwrap_err();
        assert!(matches!(missing.downcast_ref::<AppError>(), Some(AppError::NotFound(_))));
    }
}
