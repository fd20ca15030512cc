//! Error types for the collaborative document model.

use thiserror::Error;

/// Result type alias for collab operations.
pub type CollabResult<T> = Result<T, CollabError>;

/// Errors that can occur during collaborative operations.
#[derive(Error, Debug)]
pub enum CollabError {
    /// Automerge error during document operations.
    #[error("Automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    /// Autosurgeon hydration error.
    #[error("Hydration error: {0}")]
    Hydrate(#[from] autosurgeon::HydrateError),

    /// Key not present in a collaborative map.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A key holds a different kind of collaborative object than requested.
    #[error("Type mismatch at '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    /// Index out of bounds for list or text operations.
    #[error("Index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// No UI element registered under the given id.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The UI element already has a binding attached.
    #[error("Element already bound: {0}")]
    AlreadyBound(String),

    /// Unbalanced begin/end of a compound operation.
    #[error("Compound operation error: {0}")]
    CompoundOperation(String),

    /// Loader options are incomplete or malformed.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CollabError {
    /// Creates a KeyNotFound error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound(key.into())
    }

    /// Creates a TypeMismatch error.
    pub fn type_mismatch(key: impl Into<String>, expected: &'static str, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
            found: found.into(),
        }
    }

    /// Creates an IndexOutOfBounds error.
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    /// Creates an ElementNotFound error.
    pub fn element_not_found(id: impl Into<String>) -> Self {
        Self::ElementNotFound(id.into())
    }

    /// Creates an AlreadyBound error.
    pub fn already_bound(id: impl Into<String>) -> Self {
        Self::AlreadyBound(id.into())
    }

    /// Creates a CompoundOperation error.
    pub fn compound_operation(msg: impl Into<String>) -> Self {
        Self::CompoundOperation(msg.into())
    }

    /// Creates an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a Serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for CollabError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CollabError::index_out_of_bounds(5, 3).to_string(),
            "Index 5 out of bounds for length 3"
        );
        assert_eq!(
            CollabError::type_mismatch("text", "string", "list").to_string(),
            "Type mismatch at 'text': expected string, found list"
        );
        assert_eq!(
            CollabError::element_not_found("editor1").to_string(),
            "Element not found: editor1"
        );
    }
}
