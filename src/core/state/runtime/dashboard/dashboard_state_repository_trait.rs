use std::sync::Arc;
use async_trait::async_trait;

use crate::core::state::runtime::dashboard::dashboard_state::DashboardState;

#[async_trait]
pub trait DashboardStateRepositoryTrait: Send + Sync {
    async fn get(&self) -> Arc<DashboardState>;

    async fn set(&self, state: DashboardState);

    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut DashboardState) + Send + Sync;
}
