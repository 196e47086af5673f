use serde::{Deserialize, Serialize};

use crate::core::store::store_error::StoreError;

fn split_segments<S: AsRef<str>>(parts: &[S]) -> Result<Vec<String>, StoreError> {
    let segments: Vec<String> = parts
        .iter()
        .flat_map(|part| part.as_ref().split('/'))
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        return Err(StoreError::InvalidReference(
            "path must contain at least one segment".into(),
        ));
    }
    Ok(segments)
}

/// Reference to a (possibly nested) collection: `users` or `users/u1/mentorProgram`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    segments: Vec<String>,
}

impl CollectionRef {
    pub fn parse<S: AsRef<str>>(parts: &[S]) -> Result<Self, StoreError> {
        let segments = split_segments(parts)?;
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidReference(format!(
                "collection references must have an odd number of segments, but {} has {}",
                segments.join("/"),
                segments.len()
            )));
        }
        Ok(Self { segments })
    }

    pub fn new(path: &str) -> Result<Self, StoreError> {
        Self::parse(&[path])
    }

    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn doc(&self, id: &str) -> Result<DocumentRef, StoreError> {
        let mut parts = self.segments.clone();
        parts.push(id.to_string());
        DocumentRef::parse(&parts)
    }
}

/// Reference to a single document inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    collection: CollectionRef,
    id: String,
}

impl DocumentRef {
    pub fn parse<S: AsRef<str>>(parts: &[S]) -> Result<Self, StoreError> {
        let mut segments = split_segments(parts)?;
        if segments.len() % 2 != 0 {
            return Err(StoreError::InvalidReference(format!(
                "document references must have an even number of segments, but {} has {}",
                segments.join("/"),
                segments.len()
            )));
        }
        let id = segments.pop().unwrap_or_default();
        Ok(Self {
            collection: CollectionRef { segments },
            id,
        })
    }

    pub fn new(path: &str) -> Result<Self, StoreError> {
        Self::parse(&[path])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.collection.path(), self.id)
    }

    pub fn child(&self, collection: &str) -> Result<CollectionRef, StoreError> {
        let mut parts = self.collection.segments.clone();
        parts.push(self.id.clone());
        parts.push(collection.to_string());
        CollectionRef::parse(&parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_collection_paths() {
        let coll = CollectionRef::parse(&["users", "u1", "mentorProgram"]).unwrap();
        assert_eq!(coll.id(), "mentorProgram");
        assert_eq!(coll.path(), "users/u1/mentorProgram");

        let same = CollectionRef::new("users/u1/mentorProgram").unwrap();
        assert_eq!(coll, same);
    }

    #[test]
    fn segment_parity_is_enforced() {
        assert!(CollectionRef::new("users/u1").is_err());
        assert!(DocumentRef::new("users").is_err());
        assert!(CollectionRef::new("").is_err());

        let doc = DocumentRef::parse(&["users", "u1"]).unwrap();
        assert_eq!(doc.id(), "u1");
        assert_eq!(doc.collection().path(), "users");
        assert_eq!(doc.child("sessions").unwrap().path(), "users/u1/sessions");
    }
}
