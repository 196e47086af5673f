use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::state::runtime::session::query_session_state::QuerySessionState;
use crate::core::state::runtime::session::query_session_state_repository_trait::QuerySessionStateRepositoryTrait;

pub struct QuerySessionStateRepository {
    state: Arc<RwLock<Arc<QuerySessionState>>>,
}

impl QuerySessionStateRepository {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(Arc::new(QuerySessionState::with_capacity(capacity)))),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl QuerySessionStateRepositoryTrait for QuerySessionStateRepository {
    async fn get(&self) -> Arc<QuerySessionState> {
        self.state.read().await.clone()
    }

    async fn set(&self, new_state: QuerySessionState) {
        let mut guard = self.state.write().await;
        *guard = Arc::new(new_state);
    }

    /// Clone, mutate, swap. The history holds `Arc`s so the clone stays shallow.
    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut QuerySessionState) + Send + Sync,
    {
        let mut guard = self.state.write().await;
        let mut new_state = (**guard).clone();
        f(&mut new_state);
        *guard = Arc::new(new_state);
    }
}
