//! Query terminal routes (/api/v1/query/*)

use axum::{routing::{get, post}, Router};

use crate::api::controller::query::QueryController;
use crate::app_state::AppState;

pub fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/execute", post(QueryController::execute))
        .route(
            "/history",
            get(QueryController::history).delete(QueryController::clear_history),
        )
        .route("/history/{id}/export", get(QueryController::export))
        .route("/presets", get(QueryController::presets))
}
