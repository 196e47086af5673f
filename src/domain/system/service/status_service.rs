use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::api::dto::system_dto::SystemStatusResponse;
use crate::core::state::runtime::session::query_session_state_manager::QuerySessionStateManager;
use crate::core::state::runtime::session::query_session_state_repository_trait::QuerySessionStateRepositoryTrait;
use crate::core::store::document_store_trait::DocumentStore;

pub struct StatusService<R: QuerySessionStateRepositoryTrait> {
    store: Arc<dyn DocumentStore>,
    session: Arc<QuerySessionStateManager<R>>,
    started_at: DateTime<Utc>,
}

impl<R: QuerySessionStateRepositoryTrait> StatusService<R> {
    pub fn new(store: Arc<dyn DocumentStore>, session: Arc<QuerySessionStateManager<R>>) -> Self {
        Self {
            store,
            session,
            started_at: Utc::now(),
        }
    }

    pub async fn status(&self) -> Result<SystemStatusResponse> {
        let session = self.session.snapshot().await;
        Ok(SystemStatusResponse {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            store: self.store.kind(),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds(),
            history_len: session.history.len(),
            history_capacity: session.capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::session::query_session_state_repository::QuerySessionStateRepository;
    use crate::core::store::memory_store::InMemoryDocumentStore;

    #[tokio::test]
    async fn reports_store_and_history() {
        let session = Arc::new(QuerySessionStateManager::new(QuerySessionStateRepository::new(7).shared()));
        let service = StatusService::new(Arc::new(InMemoryDocumentStore::new()), session);

        let status = service.status().await.unwrap();
        assert_eq!(status.store, InMemoryDocumentStore::new().kind());
        assert_eq!(status.history_capacity, 7);
        assert_eq!(status.history_len, 0);
        assert!(status.uptime_secs >= 0);
    }
}
