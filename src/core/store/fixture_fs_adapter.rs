use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::core::store::document::{FieldMap, FieldValue};
use crate::core::store::memory_store::InMemoryDocumentStore;
use crate::core::store::reference::CollectionRef;

/// Separator used in fixture file names for nested collection paths
/// (`users__u1__sessions.json` -> `users/u1/sessions`).
const NESTED_PATH_SEPARATOR: &str = "__";

fn into_fields(value: Value) -> Result<FieldMap> {
    match FieldValue::from(value) {
        FieldValue::Map(map) => Ok(map),
        other => Err(anyhow!("expected a JSON object, found {}", other.type_name())),
    }
}

/// Loads one `<collection>.json` file. Accepts either an object keyed by
/// document id, or an array of objects carrying `id` (or `_id`).
fn load_collection_file(store: &InMemoryDocumentStore, path: &Path) -> Result<usize> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("unreadable fixture file name {:?}", path))?;
    let collection = CollectionRef::new(&stem.replace(NESTED_PATH_SEPARATOR, "/"))?;

    let raw = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let parsed: Value = serde_json::from_str(&raw).with_context(|| format!("parsing {:?}", path))?;

    let mut count = 0;
    match parsed {
        Value::Object(entries) => {
            for (id, fields) in entries {
                store.insert(&collection, &id, into_fields(fields)?)?;
                count += 1;
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.into_iter().enumerate() {
                let mut fields = into_fields(item)?;
                let id = fields
                    .shift_remove("id")
                    .or_else(|| fields.shift_remove("_id"))
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| format!("doc_{idx}"));
                store.insert(&collection, &id, fields)?;
                count += 1;
            }
        }
        _ => return Err(anyhow!("fixture {:?} must be a JSON object or array", path)),
    }

    Ok(count)
}

/// Builds an in-memory store from every `*.json` file in `dir`.
pub fn load_fixture_dir(dir: &Path) -> Result<InMemoryDocumentStore> {
    let store = InMemoryDocumentStore::new();

    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("reading fixture dir {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    for path in paths {
        match load_collection_file(&store, &path) {
            Ok(count) => tracing::info!("Loaded {} fixture documents from {:?}", count, path),
            Err(e) => tracing::error!("Skipping fixture {:?}: {}", path, e),
        }
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::document_store_trait::DocumentStore;
    use crate::core::store::reference::DocumentRef;

    #[tokio::test]
    async fn loads_object_and_array_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("users.json"),
            r#"{ "u1": { "name": "Ada", "roles": { "admin": true } } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("users__u1__sessions.json"),
            r#"[ { "id": "s1", "minutes": 30 }, { "minutes": 10 } ]"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = load_fixture_dir(dir.path()).unwrap();

        let user = store.get_one(&DocumentRef::new("users/u1").unwrap()).await.unwrap().unwrap();
        assert_eq!(user.get_field("roles.admin"), Some(&FieldValue::Bool(true)));

        let sessions = store
            .get_all(&CollectionRef::new("users/u1/sessions").unwrap(), &[])
            .await
            .unwrap();
        let ids: Vec<_> = sessions.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["doc_1", "s1"]);
        assert!(!sessions[1].fields.contains_key("id"));
    }

    #[test]
    fn missing_dir_is_an_error() {
        assert!(load_fixture_dir(Path::new("/definitely/not/here")).is_err());
    }
}
