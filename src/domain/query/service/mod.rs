pub mod query_executor;
pub mod query_terminal_service;
pub mod result_normalizer;
