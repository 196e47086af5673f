//! Analytics routes (/api/v1/analytics/*)

use axum::{routing::{get, post, put}, Router};

use crate::api::controller::analytics::AnalyticsController;
use crate::app_state::AppState;

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/overview", get(AnalyticsController::overview))
        .route("/reports/summary", get(AnalyticsController::report_summary))
        .route("/reports/export", post(AnalyticsController::export_report))
        .route(
            "/time-range",
            get(AnalyticsController::get_time_range).put(AnalyticsController::commit_time_range),
        )
        .route("/charts", get(AnalyticsController::list_charts))
        .route("/charts/{id}/granularity", put(AnalyticsController::set_chart_granularity))
        .route("/charts/{id}/series", get(AnalyticsController::chart_series))
}
