//! Error types for plexus-consensus.

use plexus_graph::GraphError;
use thiserror::Error;

/// Result type for consensus operations.
pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Errors raised while applying a resolved proposal.
///
/// Voting itself never errors: unknown proposals are reported through
/// `false`/`None` return values.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// The graph store rejected the change.
    #[error("graph store error: {0}")]
    Graph(#[from] GraphError),

    /// The proposal's change description cannot be applied.
    #[error("invalid proposal: {0}")]
    InvalidProposal(String),
}

impl ConsensusError {
    /// The store failed rather than the change; retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Graph(GraphError::Unavailable(_) | GraphError::Storage(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_outages_are_transient() {
        assert!(ConsensusError::Graph(GraphError::Unavailable("down".into())).is_transient());
        assert!(ConsensusError::Graph(GraphError::Storage("io".into())).is_transient());
        assert!(!ConsensusError::Graph(GraphError::NotFound { kind: "node", id: "x".into() }).is_transient());
        assert!(!ConsensusError::InvalidProposal("bad".into()).is_transient());
    }
}
