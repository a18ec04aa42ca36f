//! Error types for the graph store.

use thiserror::Error;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by a [`GraphStore`](crate::GraphStore).
#[derive(Debug, Error)]
pub enum GraphError {
    /// A create collided with an existing record.
    ///
    /// Genesis seeding and delta application treat this as a no-op success,
    /// so it must never be used for any other failure.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    /// Whether this error is the "already exists" create collision.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Whether this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<rocksdb::Error> for GraphError {
    fn from(e: rocksdb::Error) -> Self {
        GraphError::Storage(e.to_string())
    }
}
