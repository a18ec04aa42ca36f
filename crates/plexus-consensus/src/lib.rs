//! Plexus Consensus - agreement before structural change
//!
//! Some changes should never be applied by one station alone: pruning a
//! shared capability, dropping an edge another station relies on. Such a
//! change becomes a **proposal** that every affected station votes on.
//!
//! # Quorum
//!
//! Resolution waits for **unanimous participation**: every affected station
//! must have voted before a result exists. Approval then needs a strict
//! majority of those votes:
//!
//! ```text
//! AFFECTED   VOTES            RESULT
//! ────────────────────────────────────────
//!    2       approve          pending (one vote missing)
//!    2       approve,reject   rejected (ties never pass)
//!    2       approve,approve  approved
//!    3       a,a,r            approved
//! ```
//!
//! # Liveness
//!
//! By default a station that never votes blocks its proposal forever.
//! [`ConsensusConfig::with_timeout`] opts into a deadline after which
//! [`ConsensusCoordinator::expire_stale`] rejects the proposal.
//!
//! Proposals live only in the proposer's memory; they do not survive a
//! restart and are not replicated.

mod apply;
mod coordinator;
mod error;
mod proposal;
mod threshold;

pub use apply::{apply_outcome, record_failed_outcome, EdgeSpec};
pub use coordinator::{ConsensusConfig, ConsensusCoordinator};
pub use error::{ConsensusError, Result};
pub use proposal::{ChangeType, ConsensusRequest, Proposal, ProposalId, Resolution, Vote};
pub use threshold::{approvals_needed, majority_approves};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_table() {
        assert!(!majority_approves(0, 0)); // nobody voted
        assert!(!majority_approves(1, 1)); // tie
        assert!(majority_approves(2, 0));
        assert!(majority_approves(2, 1));
        assert!(!majority_approves(1, 2));
    }
}
