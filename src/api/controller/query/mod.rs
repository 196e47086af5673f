//! Query terminal controller

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::api::dto::paginated_response::{PaginatedResponse, PaginationQuery};
use crate::api::dto::ApiResponse;
use crate::api::util::json::{to_download, to_json};
use crate::app_state::AppState;
use crate::domain::query::dto::execute_query_request::ExecuteQueryRequest;
use crate::domain::query::dto::export_query_request::ExportQuery;
use crate::domain::query::model::query_execution::QueryExecution;
use crate::domain::query::model::query_preset::QueryPreset;
use crate::domain::query::model::query_result::QueryResult;
use crate::errors::AppError;

pub struct QueryController;

impl QueryController {
    /// Script failures come back inside the execution report, not as HTTP errors.
    pub async fn execute(
        State(state): State<AppState>,
        payload: Result<Json<ExecuteQueryRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<QueryExecution>>, AppError> {
        let Json(req) = payload.map_err(|e| AppError::BodyParsingError(e.body_text()))?;
        to_json(state.query_service.execute(req).await)
    }

    pub async fn history(
        State(state): State<AppState>,
        Query(page): Query<PaginationQuery>,
    ) -> Result<Json<ApiResponse<PaginatedResponse<QueryResult>>>, AppError> {
        to_json(state.query_service.history(page).await)
    }

    pub async fn clear_history(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Value>>, AppError> {
        to_json(state.query_service.clear_history().await)
    }

    pub async fn export(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
        Query(query): Query<ExportQuery>,
    ) -> Result<Response, AppError> {
        to_download(state.query_service.export(id, query.format).await)
    }

    pub async fn presets(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<&'static [QueryPreset]>>, AppError> {
        to_json(state.query_service.presets().await)
    }
}
