use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::domain::query::model::query_result::QueryResult;

/// Results of the current session, oldest first. Never holds more than
/// `capacity` entries; the oldest is discarded on overflow.
#[derive(Debug, Clone)]
pub struct QuerySessionState {
    pub history: VecDeque<Arc<QueryResult>>,
    pub capacity: usize,
    pub started_at: DateTime<Utc>,
}

impl Default for QuerySessionState {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl QuerySessionState {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            started_at: Utc::now(),
        }
    }

    pub fn record(&mut self, result: Arc<QueryResult>) {
        self.history.push_back(result);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }

    pub fn newest_first(&self) -> Vec<Arc<QueryResult>> {
        self.history.iter().rev().cloned().collect()
    }

    pub fn find(&self, id: Uuid) -> Option<Arc<QueryResult>> {
        self.history.iter().find(|r| r.id == id).cloned()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
