use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::paginated_response::{PaginatedResponse, PaginationQuery};
use crate::core::state::runtime::session::query_session_state_manager::QuerySessionStateManager;
use crate::core::state::runtime::session::query_session_state_repository_trait::QuerySessionStateRepositoryTrait;
use crate::core::util::export_util::{ExportFormat, ExportUtil, ExportedFile};
use crate::domain::query::dto::execute_query_request::ExecuteQueryRequest;
use crate::domain::query::model::query_execution::QueryExecution;
use crate::domain::query::model::query_preset::{QueryPreset, QUERY_PRESETS};
use crate::domain::query::model::query_result::QueryResult;
use crate::domain::query::service::query_executor::QueryExecutor;
use crate::errors::AppError;

/// Terminal front: runs scripts and keeps the session history of the ones
/// that succeeded.
pub struct QueryTerminalService<R: QuerySessionStateRepositoryTrait> {
    executor: QueryExecutor,
    session: Arc<QuerySessionStateManager<R>>,
}

impl<R: QuerySessionStateRepositoryTrait> QueryTerminalService<R> {
    pub fn new(executor: QueryExecutor, session: Arc<QuerySessionStateManager<R>>) -> Self {
        Self { executor, session }
    }

    pub async fn execute(&self, req: ExecuteQueryRequest) -> Result<QueryExecution> {
        req.validate()?;

        let mut execution = self.executor.execute(&req.code).await;
        if let Some(result) = execution.result.take() {
            let recorded = self.session.record(result).await;
            execution.result = Some(recorded.as_ref().clone());
        }
        Ok(execution)
    }

    /// Newest first.
    pub async fn history(&self, page: PaginationQuery) -> Result<PaginatedResponse<QueryResult>> {
        let all: Vec<QueryResult> = self
            .session
            .history()
            .await
            .iter()
            .map(|r| r.as_ref().clone())
            .collect();
        Ok(PaginatedResponse::page(&all, page.limit, page.offset))
    }

    pub async fn clear_history(&self) -> Result<serde_json::Value> {
        let cleared = self.session.clear().await;
        info!(cleared, "query history cleared");
        Ok(serde_json::json!({ "cleared": cleared }))
    }

    pub async fn export(&self, id: Uuid, format: ExportFormat) -> Result<ExportedFile> {
        let result = self
            .session
            .find(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("query result {id}")))?;

        let body = ExportUtil::export_rows(&result.rows, format)?;
        Ok(ExportedFile::new("query-results", format, body, Utc::now()))
    }

    pub async fn presets(&self) -> Result<&'static [QueryPreset]> {
        Ok(QUERY_PRESETS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::session::query_session_state_repository::QuerySessionStateRepository;
    use crate::core::store::document::FieldValue;
    use crate::core::store::memory_store::InMemoryDocumentStore;
    use crate::core::store::reference::CollectionRef;
    use serde_json::json;

    fn service() -> QueryTerminalService<QuerySessionStateRepository> {
        let store = InMemoryDocumentStore::new();
        let users = CollectionRef::new("users").unwrap();
        for (id, body) in [("u1", json!({ "name": "Ann, B" })), ("u2", json!({ "name": "Cy" }))] {
            let FieldValue::Map(fields) = FieldValue::from(body) else {
                unreachable!()
            };
            store.insert(&users, id, fields).unwrap();
        }
        let session = Arc::new(QuerySessionStateManager::new(
            QuerySessionStateRepository::new(50).shared(),
        ));
        QueryTerminalService::new(QueryExecutor::new(Arc::new(store)), session)
    }

    fn request(code: &str) -> ExecuteQueryRequest {
        ExecuteQueryRequest { code: code.to_string() }
    }

    #[tokio::test]
    async fn only_successful_runs_enter_history() {
        let service = service();

        service.execute(request("return await getDocs(collection(db, 'users'))")).await.unwrap();
        service.execute(request("await setDoc(doc(db, 'users', 'x'), {})")).await.unwrap();
        service.execute(request("return nope")).await.unwrap();

        let history = service.history(PaginationQuery::default()).await.unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.items[0].collection, "users");
        assert_eq!(history.items[0].row_count, 2);
    }

    #[tokio::test]
    async fn exports_recorded_result_and_rejects_unknown_ids() {
        let service = service();
        let execution = service
            .execute(request("return await getDocs(collection(db, 'users'))"))
            .await
            .unwrap();
        let id = execution.result.unwrap().id;

        let file = service.export(id, ExportFormat::Csv).await.unwrap();
        assert!(file.filename.starts_with("query-results-"));
        assert!(file.filename.ends_with(".csv"));
        assert_eq!(file.body, "_id,name\nu1,\"Ann, B\"\nu2,Cy\n");

        let err = service.export(Uuid::new_v4(), ExportFormat::Json).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn clear_history_reports_count() {
        let service = service();
        service.execute(request("return { id: 'x' }")).await.unwrap();
        let cleared = service.clear_history().await.unwrap();
        assert_eq!(cleared["cleared"], 1);
        assert_eq!(service.history(PaginationQuery::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn oversized_scripts_fail_validation() {
        let service = service();
        let code = "x".repeat(20_001);
        assert!(service.execute(request(&code)).await.is_err());
    }
}
