//! Bearer authentication and the admin gate for `/api/v1`.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::app_state::AppState;
use crate::core::store::document::{Document, FieldValue};
use crate::core::store::reference::DocumentRef;
use crate::errors::AppError;

/// Collection holding user profiles with their role flags.
pub const USERS_COLLECTION: &str = "users";

/// Resolves a bearer token to the caller's user id.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AppError>;
}

/// Fixed `token -> uid` table from configuration.
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String, AppError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("invalid token".into()))
    }
}

/// Authenticated caller, available to handlers as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub uid: String,
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("malformed Authorization header".into()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".into()))
}

/// `roles.admin == true` or a top-level `admin == true`.
pub fn is_admin(profile: &Document) -> bool {
    let flag = |path: &str| matches!(profile.get_field(path), Some(FieldValue::Bool(true)));
    flag("roles.admin") || flag("admin")
}

/// Verifies the bearer token, then requires the caller's profile to carry
/// the admin flag.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let uid = state.token_verifier.verify(bearer_token(request.headers())?).await?;

    let profile_ref = DocumentRef::parse(&[USERS_COLLECTION, uid.as_str()])
        .map_err(|_| AppError::Forbidden("unknown user".into()))?;
    let profile = state
        .store
        .get_one(&profile_ref)
        .await
        .map_err(|err| AppError::StoreError(err.to_string()))?;

    match profile {
        Some(profile) if is_admin(&profile) => {
            debug!(uid = %uid, "admin request authorized");
            request.extensions_mut().insert(AuthContext { uid });
            Ok(next.run(request).await)
        }
        _ => {
            warn!(uid = %uid, path = %request.uri().path(), "non-admin caller rejected");
            Err(AppError::Forbidden("admin role required".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn profile(body: serde_json::Value) -> Document {
        match FieldValue::from(body) {
            FieldValue::Map(fields) => Document::new("u", fields),
            _ => unreachable!(),
        }
    }

    #[test]
    fn admin_flag_in_roles_or_top_level() {
        assert!(is_admin(&profile(json!({ "roles": { "admin": true } }))));
        assert!(is_admin(&profile(json!({ "admin": true }))));
        assert!(!is_admin(&profile(json!({ "roles": { "admin": false, "tester": true } }))));
        assert!(!is_admin(&profile(json!({ "admin": "true" }))));
    }

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc");
    }

    #[tokio::test]
    async fn static_verifier_maps_tokens() {
        let verifier = StaticTokenVerifier::new(HashMap::from([("t1".to_string(), "admin1".to_string())]));
        assert_eq!(verifier.verify("t1").await.unwrap(), "admin1");
        assert!(matches!(verifier.verify("nope").await, Err(AppError::Unauthorized(_))));
    }
}
