use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::warn;

use crate::core::state::runtime::session::query_session_state_manager::QuerySessionStateManager;
use crate::core::state::runtime::session::query_session_state_repository_trait::QuerySessionStateRepositoryTrait;
use crate::core::store::document_store_trait::DocumentStore;
use crate::core::store::reference::CollectionRef;
use crate::domain::analytics::dto::overview_response::{CollectionCount, OverviewResponse, RecentQuery};
use crate::domain::query::model::query_result::QueryResult;

pub const RECENT_QUERY_LIMIT: usize = 5;

pub struct OverviewService<R: QuerySessionStateRepositoryTrait> {
    store: Arc<dyn DocumentStore>,
    session: Arc<QuerySessionStateManager<R>>,
    collections: Vec<String>,
}

impl<R: QuerySessionStateRepositoryTrait> OverviewService<R> {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: Arc<QuerySessionStateManager<R>>,
        collections: Vec<String>,
    ) -> Self {
        Self { store, session, collections }
    }

    /// Collection counts are read concurrently; a failed read only zeroes its
    /// own metric.
    pub async fn overview(&self) -> Result<OverviewResponse> {
        let collections = join_all(self.collections.iter().map(|name| self.count(name))).await;
        let history = self.session.history().await;

        Ok(OverviewResponse {
            collections,
            queries_this_session: history.len(),
            avg_execution_time_ms: average_time(&history),
            total_results_fetched: history.iter().map(|q| q.row_count).sum(),
            recent_queries: history
                .iter()
                .take(RECENT_QUERY_LIMIT)
                .map(|q| RecentQuery {
                    id: q.id,
                    action: format!("Queried {} ({} results)", q.collection, q.row_count),
                    executed_at: q.executed_at,
                })
                .collect(),
        })
    }

    async fn count(&self, name: &str) -> CollectionCount {
        let read = match CollectionRef::new(name) {
            Ok(collection) => self.store.get_all(&collection, &[]).await,
            Err(err) => Err(err),
        };
        match read {
            Ok(docs) => CollectionCount {
                collection: name.to_string(),
                count: docs.len() as u64,
                available: true,
            },
            Err(err) => {
                warn!(collection = name, error = %err, "Collection count failed; reporting 0");
                CollectionCount {
                    collection: name.to_string(),
                    count: 0,
                    available: false,
                }
            }
        }
    }
}

pub(crate) fn average_time(history: &[Arc<QueryResult>]) -> Option<u64> {
    if history.is_empty() {
        return None;
    }
    let total: u64 = history.iter().map(|q| q.execution_time_ms).sum();
    Some((total as f64 / history.len() as f64).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::session::query_session_state_repository::QuerySessionStateRepository;
    use crate::core::store::constraint::Constraint;
    use crate::core::store::document::{Document, FieldMap};
    use crate::core::store::reference::DocumentRef;
    use crate::core::store::store_error::StoreError;
    use async_trait::async_trait;

    /// Store whose `bookings` collection is unreachable.
    struct FlakyStore;

    #[async_trait]
    impl DocumentStore for FlakyStore {
        fn kind(&self) -> &'static str {
            "flaky"
        }

        async fn get_all(
            &self,
            collection: &CollectionRef,
            _constraints: &[Constraint],
        ) -> Result<Vec<Document>, StoreError> {
            match collection.path().as_str() {
                "bookings" => Err(StoreError::Unavailable("bookings offline".into())),
                "users" => Ok(vec![
                    Document::new("a", FieldMap::new()),
                    Document::new("b", FieldMap::new()),
                ]),
                _ => Ok(Vec::new()),
            }
        }

        async fn get_one(&self, _document: &DocumentRef) -> Result<Option<Document>, StoreError> {
            Ok(None)
        }
    }

    fn service() -> OverviewService<QuerySessionStateRepository> {
        let session = Arc::new(QuerySessionStateManager::new(
            QuerySessionStateRepository::new(50).shared(),
        ));
        OverviewService::new(
            Arc::new(FlakyStore),
            session,
            vec!["users".into(), "bookings".into(), "feedback".into()],
        )
    }

    #[tokio::test]
    async fn failing_collection_falls_back_to_zero() {
        let overview = service().overview().await.unwrap();

        assert_eq!(overview.collections.len(), 3);
        assert_eq!(overview.collections[0].count, 2);
        assert!(overview.collections[0].available);
        assert_eq!(overview.collections[1].count, 0);
        assert!(!overview.collections[1].available);
        assert!(overview.collections[2].available);
        assert_eq!(overview.avg_execution_time_ms, None);
    }

    #[tokio::test]
    async fn session_metrics_come_from_history() {
        let service = service();
        for (i, ms) in [10u64, 20, 31, 5, 5, 5].into_iter().enumerate() {
            let rows = vec![FieldMap::new(); i];
            service
                .session
                .record(QueryResult::new(rows, format!("c{i}"), "q", ms))
                .await;
        }

        let overview = service.overview().await.unwrap();
        assert_eq!(overview.queries_this_session, 6);
        assert_eq!(overview.avg_execution_time_ms, Some(13));
        assert_eq!(overview.total_results_fetched, 15);
        assert_eq!(overview.recent_queries.len(), RECENT_QUERY_LIMIT);
        assert_eq!(overview.recent_queries[0].action, "Queried c5 (5 results)");
    }
}
