use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::core::store::constraint::{apply_constraints, Constraint};
use crate::core::store::document::{Document, FieldMap};
use crate::core::store::document_store_trait::DocumentStore;
use crate::core::store::reference::{CollectionRef, DocumentRef};
use crate::core::store::store_error::StoreError;

/// In-process store keyed by collection path. Backs fixture mode and tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, IndexMap<String, FieldMap>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: &CollectionRef, id: &str, fields: FieldMap) -> Result<(), StoreError> {
        let mut guard = self
            .collections
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))?;
        guard
            .entry(collection.path())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    pub fn collection_count(&self) -> usize {
        self.collections.read().map(|g| g.len()).unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn get_all(
        &self,
        collection: &CollectionRef,
        constraints: &[Constraint],
    ) -> Result<Vec<Document>, StoreError> {
        let docs: Vec<Document> = {
            let guard = self
                .collections
                .read()
                .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))?;
            guard
                .get(&collection.path())
                .map(|docs| {
                    docs.iter()
                        .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };
        apply_constraints(docs, constraints)
    }

    async fn get_one(&self, document: &DocumentRef) -> Result<Option<Document>, StoreError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))?;
        Ok(guard
            .get(&document.collection().path())
            .and_then(|docs| docs.get(document.id()))
            .map(|fields| Document::new(document.id(), fields.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::constraint::{Direction, FieldPath};
    use crate::core::store::document::FieldValue;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> FieldMap {
        match FieldValue::from(value) {
            FieldValue::Map(map) => map,
            _ => FieldMap::new(),
        }
    }

    #[tokio::test]
    async fn reads_documents_and_nested_collections() {
        let store = InMemoryDocumentStore::new();
        let users = CollectionRef::new("users").unwrap();
        store.insert(&users, "u2", fields(json!({ "name": "Bo" }))).unwrap();
        store.insert(&users, "u1", fields(json!({ "name": "Ada" }))).unwrap();
        let nested = CollectionRef::new("users/u1/sessions").unwrap();
        store.insert(&nested, "s1", fields(json!({ "n": 1 }))).unwrap();

        let all = store
            .get_all(&users, &[Constraint::order_by(FieldPath::Field("name".into()), Direction::Ascending)])
            .await
            .unwrap();
        assert_eq!(all.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["u1", "u2"]);

        let one = store.get_one(&DocumentRef::new("users/u1/sessions/s1").unwrap()).await.unwrap();
        assert_eq!(one.map(|d| d.id), Some("s1".to_string()));

        let missing = store.get_one(&DocumentRef::new("users/zz").unwrap()).await.unwrap();
        assert!(missing.is_none());

        let empty = store.get_all(&CollectionRef::new("nothing").unwrap(), &[]).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(store.collection_count(), 2);
    }
}
