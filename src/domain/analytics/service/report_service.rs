use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use indexmap::IndexMap;
use tracing::info;
use validator::Validate;

use crate::core::state::runtime::session::query_session_state_manager::QuerySessionStateManager;
use crate::core::state::runtime::session::query_session_state_repository_trait::QuerySessionStateRepositoryTrait;
use crate::core::util::export_util::{ExportUtil, ExportedFile};
use crate::domain::analytics::dto::report_export_request::ReportExportRequest;
use crate::domain::analytics::dto::report_summary_response::{CollectionSummary, ReportSummaryResponse};
use crate::domain::query::model::query_result::QueryResult;
use crate::errors::AppError;

pub struct ReportService<R: QuerySessionStateRepositoryTrait> {
    session: Arc<QuerySessionStateManager<R>>,
}

impl<R: QuerySessionStateRepositoryTrait> ReportService<R> {
    pub fn new(session: Arc<QuerySessionStateManager<R>>) -> Self {
        Self { session }
    }

    pub async fn summary(&self) -> Result<ReportSummaryResponse> {
        Ok(summarize(&self.session.history().await))
    }

    /// Exports the selected history entries in request order. Unknown ids fail
    /// the whole export.
    pub async fn export(&self, req: ReportExportRequest) -> Result<ExportedFile> {
        req.validate()?;

        let mut selected = Vec::with_capacity(req.ids.len());
        for id in &req.ids {
            let result = self
                .session
                .find(*id)
                .await
                .ok_or_else(|| AppError::NotFound(format!("query result {id}")))?;
            selected.push(result);
        }

        let refs: Vec<&QueryResult> = selected.iter().map(Arc::as_ref).collect();
        let body = ExportUtil::export_report(&refs, req.format)?;
        info!(queries = refs.len(), format = ?req.format, "Report exported");
        Ok(ExportedFile::new("analytics-report", req.format, body, Utc::now()))
    }
}

pub fn summarize(history: &[Arc<QueryResult>]) -> ReportSummaryResponse {
    let mut totals: IndexMap<String, (usize, usize, u64)> = IndexMap::new();
    for q in history {
        let entry = totals.entry(q.collection.clone()).or_default();
        entry.0 += 1;
        entry.1 += q.row_count;
        entry.2 += q.execution_time_ms;
    }

    let collections: IndexMap<String, CollectionSummary> = totals
        .into_iter()
        .map(|(name, (queries, total_results, total_ms))| {
            let avg_time_ms = (total_ms as f64 / queries as f64).round() as u64;
            (name, CollectionSummary { queries, total_results, avg_time_ms })
        })
        .collect();

    ReportSummaryResponse {
        total_queries: history.len(),
        documents_retrieved: history.iter().map(|q| q.row_count).sum(),
        collections_queried: collections.len(),
        collections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::session::query_session_state_repository::QuerySessionStateRepository;
    use crate::core::store::document::FieldMap;
    use crate::core::util::export_util::ExportFormat;
    use uuid::Uuid;

    fn service() -> ReportService<QuerySessionStateRepository> {
        ReportService::new(Arc::new(QuerySessionStateManager::new(
            QuerySessionStateRepository::new(50).shared(),
        )))
    }

    async fn record(service: &ReportService<QuerySessionStateRepository>, collection: &str, rows: usize, ms: u64) -> Uuid {
        let result = QueryResult::new(vec![FieldMap::new(); rows], collection.to_string(), "q", ms);
        service.session.record(result).await.id
    }

    #[tokio::test]
    async fn summary_groups_by_collection() {
        let service = service();
        record(&service, "users", 3, 10).await;
        record(&service, "bookings", 1, 4).await;
        record(&service, "users", 2, 15).await;

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.total_queries, 3);
        assert_eq!(summary.documents_retrieved, 6);
        assert_eq!(summary.collections_queried, 2);
        assert_eq!(
            summary.collections["users"],
            CollectionSummary { queries: 2, total_results: 5, avg_time_ms: 13 }
        );
        assert_eq!(summary.collections.keys().next().map(String::as_str), Some("users"));
    }

    #[tokio::test]
    async fn export_requires_known_ids() {
        let service = service();
        let id = record(&service, "users", 1, 3).await;

        let file = service
            .export(ReportExportRequest { ids: vec![id], format: ExportFormat::Json })
            .await
            .unwrap();
        assert!(file.filename.starts_with("analytics-report-"));
        assert_eq!(file.content_type, "application/json");

        let unknown = ReportExportRequest { ids: vec![id, Uuid::new_v4()], format: ExportFormat::Csv };
        assert!(service.export(unknown).await.is_err());

        let empty = ReportExportRequest { ids: Vec::new(), format: ExportFormat::Csv };
        assert!(service.export(empty).await.is_err());
    }
}
