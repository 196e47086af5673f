use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::skip_serializing_none;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionCount {
    pub collection: String,
    pub count: u64,
    /// False when the count fell back to zero because the read failed.
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentQuery {
    pub id: Uuid,
    /// `Queried <collection> (<n> results)`
    pub action: String,
    pub executed_at: DateTime<Utc>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct OverviewResponse {
    pub collections: Vec<CollectionCount>,
    pub queries_this_session: usize,
    /// Rounded mean over the session history; absent with no history.
    pub avg_execution_time_ms: Option<u64>,
    pub total_results_fetched: usize,
    pub recent_queries: Vec<RecentQuery>,
}
