//! Error types for plexus-replication.

use thiserror::Error;

/// Result type for replication operations.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Errors raised inside the replication layer.
///
/// None of these reach callers of
/// [`replicate`](crate::ReplicationCoordinator::replicate); they are logged
/// and folded into the returned mode and success flag.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// HTTP transport failure talking to the relay
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered with a non-2xx status
    #[error("relay rejected delta with status {0}")]
    RelayRejected(u16),

    /// Offline queue log I/O
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shared store failure while draining
    #[error("graph store error: {0}")]
    Graph(#[from] plexus_graph::GraphError),
}
