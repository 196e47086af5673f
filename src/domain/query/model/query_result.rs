use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::store::document::{Document, FieldMap, FieldValue};

/// Synthetic identifier field prepended to every result row.
pub const ROW_ID_FIELD: &str = "_id";

/// Longest query text kept verbatim in history; longer text is cut and suffixed with `...`.
pub const QUERY_TEXT_LIMIT: usize = 100;

/// A flattened, display-ready record.
pub type Row = FieldMap;

/// Classified value a query script resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Result set of a collection or query read.
    DocumentList {
        collection: String,
        documents: Vec<Document>,
    },
    /// A single document (read by reference, or a plain object carrying an `id`).
    SingleDocument {
        collection: String,
        document: Document,
    },
    RawArray(Vec<FieldValue>),
    RawObject(FieldMap),
    Empty,
}

impl QueryOutcome {
    pub fn source_collection(&self) -> &str {
        match self {
            QueryOutcome::DocumentList { collection, .. }
            | QueryOutcome::SingleDocument { collection, .. } => collection,
            QueryOutcome::RawArray(_) | QueryOutcome::RawObject(_) | QueryOutcome::Empty => "query",
        }
    }
}

/// One executed query, as kept in the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: Uuid,
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub execution_time_ms: u64,
    pub collection: String,
    pub query: String,
    pub executed_at: DateTime<Utc>,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>, collection: String, query_text: &str, execution_time_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            row_count: rows.len(),
            rows,
            execution_time_ms,
            collection,
            query: truncate_query_text(query_text),
            executed_at: Utc::now(),
        }
    }
}

pub fn truncate_query_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= QUERY_TEXT_LIMIT {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(QUERY_TEXT_LIMIT).collect();
    format!("{cut}...")
}
