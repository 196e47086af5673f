use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub queries: usize,
    pub total_results: usize,
    pub avg_time_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummaryResponse {
    pub total_queries: usize,
    pub documents_retrieved: usize,
    pub collections_queried: usize,
    /// Keyed by collection, in order of first appearance (newest first).
    pub collections: IndexMap<String, CollectionSummary>,
}
