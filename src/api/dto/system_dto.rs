//! System API DTOs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LogQuery {
    pub cursor: Option<usize>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedLogResponse {
    pub date: String,
    pub lines: Vec<String>,
    pub total: usize,
    pub next_cursor: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub store: &'static str,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
    pub history_len: usize,
    pub history_capacity: usize,
}
