use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::state::runtime::dashboard::dashboard_state::DashboardState;
use crate::core::state::runtime::dashboard::dashboard_state_repository_trait::DashboardStateRepositoryTrait;

pub struct DashboardStateRepository {
    state: Arc<RwLock<Arc<DashboardState>>>,
}

impl DashboardStateRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Arc::new(DashboardState::default()))),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl DashboardStateRepositoryTrait for DashboardStateRepository {
    async fn get(&self) -> Arc<DashboardState> {
        self.state.read().await.clone()
    }

    async fn set(&self, new_state: DashboardState) {
        let mut guard = self.state.write().await;
        *guard = Arc::new(new_state);
    }

    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut DashboardState) + Send + Sync,
    {
        let mut guard = self.state.write().await;
        let mut new_state = (**guard).clone();
        f(&mut new_state);
        *guard = Arc::new(new_state);
    }
}
