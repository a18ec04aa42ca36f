//! Error types for the station node.

use axum::http::StatusCode;
use plexus_consensus::ConsensusError;
use plexus_graph::GraphError;
use plexus_replication::ReplicationError;
use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a station.
#[derive(Debug, Error)]
pub enum Error {
    /// Graph store error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Consensus error
    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    /// Replication setup error
    #[error("Replication error: {0}")]
    Replication(#[from] ReplicationError),

    /// Malformed configuration
    #[error("Invalid config: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status an API handler reports for this error.
    pub fn status(&self) -> StatusCode {
        let graph = match self {
            Error::Graph(e) | Error::Consensus(ConsensusError::Graph(e)) => e,
            Error::Consensus(ConsensusError::InvalidProposal(_)) => {
                return StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => return StatusCode::INTERNAL_SERVER_ERROR,
        };
        match graph {
            GraphError::NotFound { .. } => StatusCode::NOT_FOUND,
            GraphError::AlreadyExists { .. } => StatusCode::CONFLICT,
            GraphError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
