use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::core::store::document::FieldValue;
use crate::core::store::document_store_trait::DocumentStore;
use crate::domain::query::model::query_execution::QueryExecution;
use crate::domain::query::model::query_result::{QueryOutcome, QueryResult, Row, ROW_ID_FIELD};
use crate::domain::query::script::guard::ensure_read_only;
use crate::domain::query::script::interpreter::{classify_outcome, Interpreter};
use crate::domain::query::script::parser::parse_program;
use crate::domain::query::script::script_error::ScriptError;
use crate::domain::query::service::result_normalizer::normalize_outcome;

/// Rows echoed into the transcript after a successful run.
const PREVIEW_ROWS: usize = 3;
/// Lines of pretty JSON shown per previewed row.
const PREVIEW_LINES: usize = 8;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a query";

/// Runs operator scripts against the document store.
///
/// Scripts see only the allow-listed builtins bound to this executor's store.
/// A failing script never affects the next one: each run gets a fresh
/// interpreter.
pub struct QueryExecutor {
    store: Arc<dyn DocumentStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, code: &str) -> QueryExecution {
        if code.trim().is_empty() {
            return failed(EMPTY_QUERY_MESSAGE.to_string(), Vec::new(), 0);
        }

        let started = Instant::now();
        let (outcome, logs) = self.evaluate(code).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(outcome) => {
                let collection = outcome.source_collection().to_string();
                let rows = normalize_outcome(outcome);
                info!(collection = %collection, rows = rows.len(), elapsed_ms, "Query executed");

                let result = QueryResult::new(rows, collection, code, elapsed_ms);
                let output = success_transcript(&logs, &result);
                QueryExecution {
                    result: Some(result),
                    logs,
                    output,
                    error: None,
                    execution_time_ms: elapsed_ms,
                }
            }
            Err(err) => {
                warn!(error = %err, elapsed_ms, "Query failed");
                failed(err.to_string(), logs, elapsed_ms)
            }
        }
    }

    /// Guard, parse, run and classify. Logs captured before a failure are kept.
    async fn evaluate(&self, code: &str) -> (Result<QueryOutcome, ScriptError>, Vec<String>) {
        if let Err(err) = ensure_read_only(code) {
            return (Err(err), Vec::new());
        }
        let program = match parse_program(code) {
            Ok(program) => program,
            Err(err) => return (Err(err), Vec::new()),
        };

        let mut interpreter = Interpreter::new(self.store.as_ref());
        let value = interpreter.run(&program).await;
        let logs = interpreter.into_logs();
        (value.and_then(classify_outcome), logs)
    }
}

fn failed(message: String, logs: Vec<String>, elapsed_ms: u64) -> QueryExecution {
    let mut output = console_section(&logs);
    output.push(format!("Error: {message}"));
    QueryExecution {
        result: None,
        logs,
        output,
        error: Some(message),
        execution_time_ms: elapsed_ms,
    }
}

fn console_section(logs: &[String]) -> Vec<String> {
    if logs.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Console Output:".to_string()];
    lines.extend(logs.iter().map(|log| format!("   {log}")));
    lines
}

fn row_label(row: &Row) -> String {
    match row.get(ROW_ID_FIELD) {
        Some(FieldValue::String(id)) => id.clone(),
        Some(other) => other.to_json().to_string(),
        None => "-".to_string(),
    }
}

fn success_transcript(logs: &[String], result: &QueryResult) -> Vec<String> {
    let mut output = console_section(logs);
    output.push("Query executed successfully".to_string());
    output.push(format!("   Results: {} document(s)", result.row_count));
    output.push(format!("   Execution time: {}ms", result.execution_time_ms));

    if result.rows.is_empty() {
        output.push("No documents found matching your query.".to_string());
        return output;
    }

    let shown = result.rows.len().min(PREVIEW_ROWS);
    output.push(format!("Results Preview (first {shown}):"));
    for (idx, row) in result.rows.iter().take(shown).enumerate() {
        output.push(format!("[{}] ID: {}", idx + 1, row_label(row)));
        let pretty = serde_json::to_string_pretty(row).unwrap_or_default();
        output.extend(pretty.lines().take(PREVIEW_LINES).map(str::to_string));
    }
    if result.rows.len() > shown {
        output.push(format!(
            "   ... and {} more results",
            result.rows.len() - shown
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::document::FieldMap;
    use crate::core::store::memory_store::InMemoryDocumentStore;
    use crate::core::store::reference::CollectionRef;
    use serde_json::json;

    fn executor(docs: &[(&str, serde_json::Value)]) -> QueryExecutor {
        let store = InMemoryDocumentStore::new();
        let items = CollectionRef::new("items").unwrap();
        for (id, body) in docs {
            let FieldValue::Map(fields) = FieldValue::from(body.clone()) else {
                panic!("fixture must be an object");
            };
            store.insert(&items, id, fields).unwrap();
        }
        QueryExecutor::new(Arc::new(store))
    }

    #[tokio::test]
    async fn three_documents_become_three_rows() {
        let executor = executor(&[
            ("a", json!({ "x": 1 })),
            ("b", json!({ "x": 2 })),
            ("c", json!({ "x": 3 })),
        ]);

        let execution = executor
            .execute("return await getDocs(collection(db, 'items'))")
            .await;

        assert!(execution.is_success());
        let result = execution.result.unwrap();
        assert_eq!(result.row_count, 3);
        assert_eq!(result.collection, "items");
        for row in &result.rows {
            assert_eq!(row.keys().next().map(String::as_str), Some(ROW_ID_FIELD));
        }
        let mut expected = FieldMap::new();
        expected.insert(ROW_ID_FIELD.to_string(), FieldValue::from("b"));
        expected.insert("x".to_string(), FieldValue::Integer(2));
        assert_eq!(result.rows[1], expected);
        assert!(execution.output.iter().any(|l| l == "   Results: 3 document(s)"));
        assert!(execution.output.iter().any(|l| l == "[1] ID: a"));
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let executor = executor(&[]);

        let blocked = executor.execute("await deleteDoc(doc(db, 'items', 'a'))").await;
        assert_eq!(blocked.error.as_deref(), Some("Write operation blocked: found \"deleteDoc\""));
        assert!(blocked.result.is_none());

        let syntax = executor.execute("return getDocs(").await;
        assert!(syntax.error.unwrap().starts_with("SyntaxError"));

        let depth = 3000;
        let nested = executor
            .execute(&format!("return {}1{}", "(".repeat(depth), ")".repeat(depth)))
            .await;
        assert!(nested.error.unwrap().starts_with("SyntaxError: nesting too deep"));

        let runtime = executor.execute("console.log('before'); return missing").await;
        assert_eq!(runtime.error.as_deref(), Some("missing is not defined"));
        assert_eq!(runtime.logs, vec!["before".to_string()]);

        let empty = executor.execute("   ").await;
        assert_eq!(empty.error.as_deref(), Some(EMPTY_QUERY_MESSAGE));

        // the executor stays usable after failures
        let ok = executor.execute("return { total: 0 }").await;
        assert_eq!(ok.result.map(|r| r.row_count), Some(1));
    }

    #[tokio::test]
    async fn empty_results_say_so() {
        let executor = executor(&[]);
        let execution = executor.execute("return await getDocs(collection(db, 'items'))").await;
        assert_eq!(execution.result.as_ref().map(|r| r.row_count), Some(0));
        assert_eq!(
            execution.output.last().map(String::as_str),
            Some("No documents found matching your query.")
        );
    }
}
