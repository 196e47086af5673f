use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::middleware::auth::require_admin;
use crate::app_state::AppState;

/// Build the main application router
pub fn app_router(state: &AppState) -> Router<AppState> {
    // Every /api/v1 route needs an admin bearer token
    let api_v1 = Router::new()
        .nest("/query", crate::api::routes::query_routes::query_routes())
        .nest("/analytics", crate::api::routes::analytics_routes::analytics_routes())
        .nest("/system", crate::api::routes::system_routes::system_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1)
        .fallback(handler_404)
        .layer(CorsLayer::very_permissive())
}

async fn root() -> &'static str {
    "Server is running!"
}

async fn health_check() -> &'static str {
    "OK"
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        "The requested resource was not found",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::app_state::build_app_state;
    use crate::config::AppConfig;
    use crate::core::store::document::FieldValue;
    use crate::core::store::memory_store::InMemoryDocumentStore;
    use crate::core::store::reference::CollectionRef;

    fn app() -> Router {
        let store = InMemoryDocumentStore::new();
        let users = CollectionRef::new("users").unwrap();
        for (id, body) in [
            ("admin1", json!({ "name": "Ada", "roles": { "admin": true, "mentor": false } })),
            ("user1", json!({ "name": "Bo", "roles": { "admin": false } })),
        ] {
            let FieldValue::Map(fields) = FieldValue::from(body) else {
                unreachable!()
            };
            store.insert(&users, id, fields).unwrap();
        }

        let config = AppConfig::from_lookup(|key| match key {
            "ANALYTICS_API_TOKENS" => Some("admin-token=admin1,user-token=user1".into()),
            _ => None,
        })
        .unwrap();
        let state = build_app_state(&config, Arc::new(store));
        app_router(&state).with_state(state)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn liveness_routes_need_no_token() {
        let response = app().oneshot(request("GET", "/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app().oneshot(request("GET", "/nope", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_requires_admin_bearer() {
        let anonymous = app().oneshot(request("GET", "/api/v1/query/presets", None, None)).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let bad = app()
            .oneshot(request("GET", "/api/v1/query/presets", Some("wrong"), None))
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

        let user = app()
            .oneshot(request("GET", "/api/v1/query/presets", Some("user-token"), None))
            .await
            .unwrap();
        assert_eq!(user.status(), StatusCode::FORBIDDEN);

        let admin = app()
            .oneshot(request("GET", "/api/v1/query/presets", Some("admin-token"), None))
            .await
            .unwrap();
        assert_eq!(admin.status(), StatusCode::OK);
        let body = json_body(admin).await;
        assert_eq!(body["is_successful"], true);
        assert!(body["data"].as_array().map(|a| !a.is_empty()).unwrap_or(false));
    }

    #[tokio::test]
    async fn execute_reports_rows_and_errors_in_body() {
        let ok = app()
            .oneshot(request(
                "POST",
                "/api/v1/query/execute",
                Some("admin-token"),
                Some(json!({ "code": "return await getDocs(collection(db, 'users'))" })),
            ))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body = json_body(ok).await;
        assert_eq!(body["data"]["result"]["row_count"], 2);
        assert_eq!(body["data"]["result"]["rows"][0]["roles"], "admin");

        let failed = app()
            .oneshot(request(
                "POST",
                "/api/v1/query/execute",
                Some("admin-token"),
                Some(json!({ "code": "await deleteDoc(doc(db, 'users', 'user1'))" })),
            ))
            .await
            .unwrap();
        assert_eq!(failed.status(), StatusCode::OK);
        let body = json_body(failed).await;
        assert_eq!(body["data"]["error"], "Write operation blocked: found \"deleteDoc\"");

        let malformed = app()
            .oneshot(request("POST", "/api/v1/query/execute", Some("admin-token"), Some(json!({ "nope": 1 }))))
            .await
            .unwrap();
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn inverted_time_range_is_a_bad_request() {
        let response = app()
            .oneshot(request(
                "PUT",
                "/api/v1/analytics/time-range",
                Some("admin-token"),
                Some(json!({ "start": "2024-06-08T00:00:00Z", "end": "2024-06-01T00:00:00Z" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Start date must be before end date");
    }
}
