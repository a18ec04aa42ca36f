//! Consensus Coordinator - in-memory proposals and per-station votes.
//!
//! The coordinator lives in the proposing station's process. Votes from other
//! stations reach it as remote calls, so that process must stay reachable for
//! as long as a proposal is open.

use crate::proposal::{ConsensusRequest, Proposal, ProposalId, Resolution, Vote};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for a consensus coordinator.
#[derive(Debug, Clone, Default)]
pub struct ConsensusConfig {
    /// Deadline after which [`ConsensusCoordinator::expire_stale`] rejects an
    /// open proposal. `None` keeps proposals open indefinitely.
    pub timeout: Option<Duration>,
}

impl ConsensusConfig {
    /// Set the proposal deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the proposal deadline.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

#[derive(Debug)]
struct OpenProposal {
    request: ConsensusRequest,
    sequence: u64,
    opened_at: Instant,
}

/// Tracks open proposals and resolves them once every affected station voted.
#[derive(Debug, Default)]
pub struct ConsensusCoordinator {
    config: ConsensusConfig,
    open: HashMap<ProposalId, OpenProposal>,
    issued: u64,
}

impl ConsensusCoordinator {
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            config,
            open: HashMap::new(),
            issued: 0,
        }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Open a proposal with an empty vote map and return its fresh id.
    pub fn propose<I, S>(&mut self, proposal: Proposal, proposer_station_id: &str, affected_station_ids: I) -> ProposalId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let proposal_id = loop {
            let candidate = self.next_id(proposer_station_id);
            if !self.open.contains_key(&candidate) {
                break candidate;
            }
        };

        let request = ConsensusRequest {
            proposal_id: proposal_id.clone(),
            proposal,
            proposer_station_id: proposer_station_id.to_string(),
            affected_station_ids: affected_station_ids.into_iter().map(Into::into).collect(),
            votes: BTreeMap::new(),
            created_at: plexus_graph::now_millis(),
        };

        info!(
            %proposal_id,
            change = request.proposal.change_type.as_str(),
            target = %request.proposal.target_id,
            voters = request.affected_station_ids.len(),
            "Proposal opened"
        );

        self.open.insert(
            proposal_id.clone(),
            OpenProposal {
                request,
                sequence: self.issued,
                opened_at: Instant::now(),
            },
        );
        proposal_id
    }

    /// Record `station_id`'s vote, overwriting any earlier one.
    ///
    /// Returns `false`, changing nothing, if the proposal is unknown.
    pub fn cast_vote(&mut self, proposal_id: &ProposalId, station_id: &str, vote: Vote) -> bool {
        let Some(open) = self.open.get_mut(proposal_id) else {
            debug!(%proposal_id, station_id, "Vote for unknown proposal ignored");
            return false;
        };

        if !open.request.affected_station_ids.contains(station_id) {
            warn!(%proposal_id, station_id, "Vote from station outside the voter set will not be tallied");
        }

        if let Some(previous) = open.request.votes.insert(station_id.to_string(), vote) {
            debug!(%proposal_id, station_id, ?previous, ?vote, "Vote replaced");
        } else {
            debug!(%proposal_id, station_id, ?vote, "Vote recorded");
        }
        true
    }

    /// Resolve a proposal once every affected station has voted.
    ///
    /// Returns `None` while any vote is missing or if the proposal is
    /// unknown. A returned resolution removes the proposal.
    pub fn resolve(&mut self, proposal_id: &ProposalId) -> Option<Resolution> {
        if !self.open.get(proposal_id)?.request.has_quorum() {
            return None;
        }

        let open = self.open.remove(proposal_id)?;
        let resolution = open.request.into_resolution();

        info!(
            %proposal_id,
            approved = resolution.approved,
            approve = resolution.approve_count,
            reject = resolution.reject_count,
            "Proposal resolved"
        );

        Some(resolution)
    }

    /// Reopen a resolved request, votes intact, after its outcome could not
    /// be recorded. It is queued behind every open proposal and its deadline
    /// restarts.
    pub fn reinstate(&mut self, request: ConsensusRequest) {
        self.issued += 1;
        warn!(proposal_id = %request.proposal_id, "Proposal reopened after failed outcome");
        self.open.insert(
            request.proposal_id.clone(),
            OpenProposal {
                request,
                sequence: self.issued,
                opened_at: Instant::now(),
            },
        );
    }

    /// All proposals not yet resolved, oldest first.
    pub fn list_pending(&self) -> Vec<ConsensusRequest> {
        let mut pending: Vec<_> = self.open.values().collect();
        pending.sort_by_key(|open| open.sequence);
        pending.into_iter().map(|open| open.request.clone()).collect()
    }

    pub fn get(&self, proposal_id: &ProposalId) -> Option<&ConsensusRequest> {
        self.open.get(proposal_id).map(|open| &open.request)
    }

    pub fn pending_count(&self) -> usize {
        self.open.len()
    }

    /// Reject and remove proposals open longer than the configured deadline.
    ///
    /// A no-op without a deadline.
    pub fn expire_stale(&mut self) -> Vec<Resolution> {
        let Some(timeout) = self.config.timeout else {
            return Vec::new();
        };

        let expired: Vec<ProposalId> = self
            .open
            .iter()
            .filter(|(_, open)| open.opened_at.elapsed() >= timeout)
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.open.remove(&id))
            .map(|open| {
                let missing: Vec<String> =
                    open.request.missing_voters().into_iter().map(String::from).collect();
                let mut resolution = open.request.into_resolution();
                resolution.approved = false;
                warn!(
                    proposal_id = %resolution.proposal_id,
                    ?missing,
                    "Proposal expired before all votes arrived"
                );
                resolution
            })
            .collect()
    }

    /// `prop-` followed by 24 hex chars of BLAKE3(proposer, sequence, clock, salt).
    fn next_id(&mut self, proposer_station_id: &str) -> ProposalId {
        self.issued += 1;
        let salt: u64 = rand::thread_rng().gen();

        let mut hasher = blake3::Hasher::new();
        hasher.update(proposer_station_id.as_bytes());
        hasher.update(&self.issued.to_be_bytes());
        hasher.update(&plexus_graph::now_millis().to_be_bytes());
        hasher.update(&salt.to_be_bytes());

        ProposalId::new(format!("prop-{}", hex::encode(&hasher.finalize().as_bytes()[..12])))
    }
}
