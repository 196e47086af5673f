pub mod dashboard_state;
pub mod dashboard_state_manager;
pub mod dashboard_state_repository;
pub mod dashboard_state_repository_trait;
