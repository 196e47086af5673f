use thiserror::Error;

use crate::core::store::store_error::StoreError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("SyntaxError: {message} (line {line}, column {column})")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("{0} is not defined")]
    NotDefined(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("Write operation blocked: found \"{0}\"")]
    Blocked(String),

    #[error("{0}")]
    Store(String),

    /// Raised by a `throw` statement in the script.
    #[error("{0}")]
    Thrown(String),
}

impl From<StoreError> for ScriptError {
    fn from(err: StoreError) -> Self {
        ScriptError::Store(err.to_string())
    }
}
