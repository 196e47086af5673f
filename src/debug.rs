use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::store::document_store_trait::DocumentStore;
use crate::domain::query::service::query_executor::QueryExecutor;

/// One-shot administrative run (ANALYTICS_DEBUG_MODE): executes the query in
/// `query_file` once, prints the transcript and exits.
pub async fn run_debug(store: Arc<dyn DocumentStore>, query_file: Option<&Path>) -> Result<()> {
    info!("Debug mode: running one-shot query");

    let Some(path) = query_file else {
        warn!("ANALYTICS_DEBUG_QUERY_FILE is not set; nothing to run");
        return Ok(());
    };
    let code = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let execution = QueryExecutor::new(store).execute(&code).await;
    for line in &execution.output {
        println!("{line}");
    }
    if let Some(result) = &execution.result {
        println!("{}", serde_json::to_string_pretty(&result.rows)?);
    }

    info!(success = execution.is_success(), "Debug tasks completed. Exiting...");
    Ok(())
}
