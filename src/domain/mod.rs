pub mod analytics;
pub mod common;
pub mod query;
pub mod system;
