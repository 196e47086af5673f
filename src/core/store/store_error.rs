use thiserror::Error;

/// Rejections raised by the document store or its reference/constraint builders.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed store data: {0}")]
    Malformed(String),
}
