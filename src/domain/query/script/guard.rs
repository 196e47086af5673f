//! Pre-execution scan that rejects write-capable store calls.

use crate::domain::query::script::script_error::ScriptError;

pub const BLOCKED_OPERATIONS: &[&str] = &[
    "setDoc",
    "updateDoc",
    "deleteDoc",
    "addDoc",
    "writeBatch",
    "runTransaction",
    "deleteField",
    "arrayUnion",
    "arrayRemove",
    "increment",
    "serverTimestamp",
    "enableNetwork",
    "disableNetwork",
    "clearPersistence",
    "terminate",
    "waitForPendingWrites",
];

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Case-insensitive whole-identifier match against [`BLOCKED_OPERATIONS`].
/// Returns the canonical spelling of the first hit.
pub fn find_blocked_operation(source: &str) -> Option<&'static str> {
    source
        .split(|c: char| !is_ident_char(c))
        .filter(|word| !word.is_empty())
        .find_map(|word| {
            BLOCKED_OPERATIONS
                .iter()
                .copied()
                .find(|op| op.eq_ignore_ascii_case(word))
        })
}

pub fn ensure_read_only(source: &str) -> Result<(), ScriptError> {
    match find_blocked_operation(source) {
        Some(op) => Err(ScriptError::Blocked(op.to_string())),
        None => Ok(()),
    }
}
