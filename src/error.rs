use thiserror::Error;

use crate::models::LifecycleState;

/// Fail-fast errors raised at the call site for invalid configuration or input.
///
/// Soft lookups (missing views, unresolved dependencies) never produce these;
/// they log and return `None`/`false` instead.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("The key cannot be empty")]
    EmptyKey,

    #[error("Published view '{name}' is declared by both '{first}' and '{second}'")]
    DuplicateView {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid lifecycle state: expected {expected}, found {actual}")]
    InvalidState {
        expected: LifecycleState,
        actual: LifecycleState,
    },

    #[error("Features have already been loaded")]
    AlreadyLoaded,

    #[error("Could not serialize value for '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejects empty or whitespace-only keys.
pub(crate) fn require_key(key: &str) -> Result<(), ShellError> {
    if key.trim().is_empty() {
        return Err(ShellError::EmptyKey);
    }
    Ok(())
}
