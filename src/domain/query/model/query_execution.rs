use serde::Serialize;

use crate::domain::query::model::query_result::QueryResult;

/// Report of one terminal run. Execution errors are carried in `error`
/// instead of failing the request.
#[derive(Debug, Clone, Serialize)]
pub struct QueryExecution {
    pub result: Option<QueryResult>,
    /// Console output captured from the script, in call order.
    pub logs: Vec<String>,
    /// Terminal transcript: logs, status line and a preview of the first rows.
    pub output: Vec<String>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl QueryExecution {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
