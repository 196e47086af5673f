//! Analytics controller: overview, reports, time range and charts

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::api::util::json::{to_download, to_json};
use crate::app_state::AppState;
use crate::domain::analytics::dto::chart_response::{ChartSeriesResponse, ChartView};
use crate::domain::analytics::dto::granularity_request::GranularityRequest;
use crate::domain::analytics::dto::overview_response::OverviewResponse;
use crate::domain::analytics::dto::report_export_request::ReportExportRequest;
use crate::domain::analytics::dto::report_summary_response::ReportSummaryResponse;
use crate::domain::analytics::dto::time_range_request::TimeRangeRequest;
use crate::domain::common::model::TimeRange;
use crate::errors::AppError;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::BodyParsingError(e.body_text()))
}

pub struct AnalyticsController;

impl AnalyticsController {
    pub async fn overview(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<OverviewResponse>>, AppError> {
        to_json(state.analytics_service.overview().await)
    }

    pub async fn report_summary(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<ReportSummaryResponse>>, AppError> {
        to_json(state.analytics_service.report_summary().await)
    }

    pub async fn export_report(
        State(state): State<AppState>,
        payload: Result<Json<ReportExportRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        to_download(state.analytics_service.export_report(body(payload)?).await)
    }

    pub async fn get_time_range(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<TimeRange>>, AppError> {
        to_json(state.analytics_service.time_range().await)
    }

    pub async fn commit_time_range(
        State(state): State<AppState>,
        payload: Result<Json<TimeRangeRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<TimeRange>>, AppError> {
        to_json(state.analytics_service.commit_time_range(body(payload)?).await)
    }

    pub async fn list_charts(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Vec<ChartView>>>, AppError> {
        to_json(state.analytics_service.list_charts().await)
    }

    pub async fn set_chart_granularity(
        State(state): State<AppState>,
        Path(id): Path<String>,
        payload: Result<Json<GranularityRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<ChartView>>, AppError> {
        to_json(state.analytics_service.set_granularity(&id, body(payload)?).await)
    }

    pub async fn chart_series(
        State(state): State<AppState>,
        Path(id): Path<String>,
    ) -> Result<Json<ApiResponse<ChartSeriesResponse>>, AppError> {
        to_json(state.analytics_service.series(&id).await)
    }
}
