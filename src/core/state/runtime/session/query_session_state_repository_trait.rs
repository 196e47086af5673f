use std::sync::Arc;
use async_trait::async_trait;

use crate::core::state::runtime::session::query_session_state::QuerySessionState;

#[async_trait]
pub trait QuerySessionStateRepositoryTrait: Send + Sync {
    /// Current snapshot; results are shared, not copied.
    async fn get(&self) -> Arc<QuerySessionState>;

    async fn set(&self, state: QuerySessionState);

    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut QuerySessionState) + Send + Sync;
}
