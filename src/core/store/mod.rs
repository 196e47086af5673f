pub mod constraint;
pub mod document;
pub mod document_store_trait;
pub mod fixture_fs_adapter;
pub mod http_store;
pub mod memory_store;
pub mod reference;
pub mod store_error;

use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;
use crate::core::store::document_store_trait::DocumentStore;
use crate::core::store::http_store::HttpDocumentStore;
use crate::core::store::memory_store::InMemoryDocumentStore;

/// Picks the store backend: gateway when a URL is configured, otherwise the
/// fixture directory, otherwise an empty in-memory store.
pub fn build_document_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    if let Some(url) = &config.store_url {
        tracing::info!(%url, "Using HTTP document store");
        return Ok(Arc::new(HttpDocumentStore::new(
            reqwest::Client::new(),
            url,
            config.store_token.clone(),
        )));
    }

    if config.fixture_dir.is_dir() {
        tracing::info!(dir = ?config.fixture_dir, "Using fixture document store");
        let store = fixture_fs_adapter::load_fixture_dir(&config.fixture_dir)?;
        return Ok(Arc::new(store));
    }

    tracing::warn!(
        dir = ?config.fixture_dir,
        "No store URL and no fixture directory; starting with an empty in-memory store"
    );
    Ok(Arc::new(InMemoryDocumentStore::new()))
}
