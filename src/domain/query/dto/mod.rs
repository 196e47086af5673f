pub mod execute_query_request;
pub mod export_query_request;
