//! API route declarations (e.g., /api/v1/*)

pub mod analytics_routes;
pub mod query_routes;
pub mod system_routes;
