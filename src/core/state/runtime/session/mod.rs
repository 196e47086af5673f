pub mod query_session_state;
pub mod query_session_state_manager;
pub mod query_session_state_repository;
pub mod query_session_state_repository_trait;
