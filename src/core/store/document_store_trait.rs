use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::store::constraint::Constraint;
use crate::core::store::document::{Document, StoreTimestamp};
use crate::core::store::reference::{CollectionRef, DocumentRef};
use crate::core::store::store_error::StoreError;

/// Read access to the remote document store.
///
/// Implementations only need to fetch documents; constraint evaluation can be
/// delegated to [`crate::core::store::constraint::apply_constraints`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for status reporting.
    fn kind(&self) -> &'static str;

    /// All documents of `collection` satisfying `constraints`, in constraint order.
    async fn get_all(
        &self,
        collection: &CollectionRef,
        constraints: &[Constraint],
    ) -> Result<Vec<Document>, StoreError>;

    /// A single document, `None` when it does not exist.
    async fn get_one(&self, document: &DocumentRef) -> Result<Option<Document>, StoreError>;

    /// Store-native timestamp for `date`, or for the current instant.
    fn make_timestamp(&self, date: Option<DateTime<Utc>>) -> StoreTimestamp {
        date.map(StoreTimestamp::from_date)
            .unwrap_or_else(StoreTimestamp::now)
    }
}
