use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::core::store::constraint::{apply_constraints, Constraint};
use crate::core::store::document::Document;
use crate::core::store::document_store_trait::DocumentStore;
use crate::core::store::reference::{CollectionRef, DocumentRef};
use crate::core::store::store_error::StoreError;

/// Document store reached over a JSON gateway.
///
/// `GET {base}/collections/{path}/documents` returns the collection's documents,
/// `GET {base}/documents/{path}` a single document (404 when absent).
/// Constraints are evaluated locally after the fetch.
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CollectionPayload {
    Wrapped { documents: Vec<Document> },
    Bare(Vec<Document>),
}

impl HttpDocumentStore {
    pub fn new(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn encode_path(segments: &[String]) -> String {
        segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn unavailable(err: reqwest::Error) -> StoreError {
        StoreError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    fn kind(&self) -> &'static str {
        "http"
    }

    async fn get_all(
        &self,
        collection: &CollectionRef,
        constraints: &[Constraint],
    ) -> Result<Vec<Document>, StoreError> {
        let url = format!(
            "{}/collections/{}/documents",
            self.base_url,
            Self::encode_path(collection.segments())
        );
        tracing::debug!(%url, "Fetching collection");

        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(Self::unavailable)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "gateway returned {} for {}",
                status,
                collection.path()
            )));
        }

        let payload: CollectionPayload = resp
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        let docs = match payload {
            CollectionPayload::Wrapped { documents } => documents,
            CollectionPayload::Bare(documents) => documents,
        };

        apply_constraints(docs, constraints)
    }

    async fn get_one(&self, document: &DocumentRef) -> Result<Option<Document>, StoreError> {
        let mut segments = document.collection().segments().to_vec();
        segments.push(document.id().to_string());
        let url = format!("{}/documents/{}", self.base_url, Self::encode_path(&segments));
        tracing::debug!(%url, "Fetching document");

        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(Self::unavailable)?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => resp
                .json::<Document>()
                .await
                .map(Some)
                .map_err(|e| StoreError::Malformed(e.to_string())),
            status => Err(StoreError::Unavailable(format!(
                "gateway returned {} for {}",
                status,
                document.path()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_percent_encoded() {
        let encoded = HttpDocumentStore::encode_path(&["users".to_string(), "a b/c".to_string()]);
        assert_eq!(encoded, "users/a%20b%2Fc");
    }

    #[test]
    fn collection_payload_accepts_both_shapes() {
        let wrapped: CollectionPayload =
            serde_json::from_str(r#"{"documents":[{"id":"a","fields":{"n":1}}]}"#).unwrap();
        assert!(matches!(wrapped, CollectionPayload::Wrapped { documents } if documents.len() == 1));

        let bare: CollectionPayload = serde_json::from_str(r#"[{"id":"a"},{"id":"b"}]"#).unwrap();
        assert!(matches!(bare, CollectionPayload::Bare(documents) if documents.len() == 2));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = HttpDocumentStore::new(Client::new(), "http://localhost:9000/v1/", None);
        assert_eq!(store.base_url, "http://localhost:9000/v1");
    }
}
