pub mod query_execution;
pub mod query_preset;
pub mod query_result;
