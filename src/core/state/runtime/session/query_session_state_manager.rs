use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::core::state::runtime::session::query_session_state::QuerySessionState;
use crate::core::state::runtime::session::query_session_state_repository_trait::QuerySessionStateRepositoryTrait;
use crate::domain::query::model::query_result::QueryResult;

pub struct QuerySessionStateManager<R: QuerySessionStateRepositoryTrait> {
    pub(crate) repo: Arc<R>,
}

impl<R: QuerySessionStateRepositoryTrait> QuerySessionStateManager<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Appends a successful result to the bounded history.
    pub async fn record(&self, result: QueryResult) -> Arc<QueryResult> {
        let result = Arc::new(result);
        let entry = result.clone();
        self.repo.update(move |state| state.record(entry)).await;
        debug!(id = %result.id, rows = result.row_count, "query result recorded");
        result
    }

    /// History, most recent first.
    pub async fn history(&self) -> Vec<Arc<QueryResult>> {
        self.repo.get().await.newest_first()
    }

    pub async fn find(&self, id: Uuid) -> Option<Arc<QueryResult>> {
        self.repo.get().await.find(id)
    }

    /// Empties the history and returns how many results were dropped.
    pub async fn clear(&self) -> usize {
        let dropped = self.repo.get().await.history.len();
        self.repo.update(|state| state.clear()).await;
        dropped
    }

    pub async fn snapshot(&self) -> Arc<QuerySessionState> {
        self.repo.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::session::query_session_state_repository::QuerySessionStateRepository;

    fn result(label: &str) -> QueryResult {
        QueryResult::new(Vec::new(), label.to_string(), label, 1)
    }

    #[tokio::test]
    async fn history_keeps_most_recent_results() {
        let manager = QuerySessionStateManager::new(QuerySessionStateRepository::new(50).shared());
        for i in 0..55 {
            manager.record(result(&format!("q{i}"))).await;
        }

        let history = manager.history().await;
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].query, "q54");
        assert_eq!(history[49].query, "q5");
    }

    #[tokio::test]
    async fn find_and_clear() {
        let manager = QuerySessionStateManager::new(QuerySessionStateRepository::new(3).shared());
        let first = manager.record(result("a")).await;
        manager.record(result("b")).await;

        assert_eq!(manager.find(first.id).await.map(|r| r.query.clone()), Some("a".to_string()));
        assert_eq!(manager.clear().await, 2);
        assert!(manager.history().await.is_empty());
        assert!(manager.find(first.id).await.is_none());
    }
}
