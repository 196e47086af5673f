//! System controller: status and log viewer

use axum::extract::{Path, Query, State};
use axum::Json;
use validator::Validate;

use crate::api::dto::system_dto::{LogQuery, PaginatedLogResponse, SystemStatusResponse};
use crate::api::dto::ApiResponse;
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::errors::AppError;

pub struct SystemController;

impl SystemController {
    pub async fn status(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<SystemStatusResponse>>, AppError> {
        to_json(state.system_service.status().await)
    }

    pub async fn get_system_log_file_list(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
        to_json(state.system_service.get_system_log_file_list().await)
    }

    pub async fn get_system_log_lines(
        State(state): State<AppState>,
        Path(date): Path<String>,
        Query(query): Query<LogQuery>,
    ) -> Result<Json<ApiResponse<PaginatedLogResponse>>, AppError> {
        query
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        to_json(
            state
                .system_service
                .get_system_log_lines(&date, query.cursor, query.limit)
                .await,
        )
    }
}
