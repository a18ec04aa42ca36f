//! Proposals, votes and resolutions.

use crate::threshold::majority_approves;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural change a proposal asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Move a node to `pruned`
    PruneNode,
    /// Drop an edge
    RemoveEdge,
    /// Create an edge described by `proposed_changes`
    AddEdge,
}

impl ChangeType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PruneNode => "prune_node",
            Self::RemoveEdge => "remove_edge",
            Self::AddEdge => "add_edge",
        }
    }
}

/// A tagged change description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub change_type: ChangeType,
    pub target_id: String,
    pub reason: String,
    #[serde(default)]
    pub proposed_changes: serde_json::Value,
}

impl Proposal {
    pub fn new(change_type: ChangeType, target_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            change_type,
            target_id: target_id.into(),
            reason: reason.into(),
            proposed_changes: serde_json::Value::Null,
        }
    }

    pub fn prune_node(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ChangeType::PruneNode, node_id, reason)
    }

    pub fn remove_edge(edge_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ChangeType::RemoveEdge, edge_id, reason)
    }

    #[must_use]
    pub fn with_changes(mut self, changes: serde_json::Value) -> Self {
        self.proposed_changes = changes;
        self
    }
}

/// A station's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Approve,
    Reject,
}

/// A pending proposal and the votes cast on it so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusRequest {
    pub proposal_id: ProposalId,
    pub proposal: Proposal,
    pub proposer_station_id: String,

    /// Required voter set
    pub affected_station_ids: BTreeSet<String>,

    /// One entry per station; a re-vote overwrites
    pub votes: BTreeMap<String, Vote>,

    pub created_at: u64,
}

impl ConsensusRequest {
    /// Affected stations that have not voted yet.
    pub fn missing_voters(&self) -> Vec<&str> {
        self.affected_station_ids
            .iter()
            .filter(|s| !self.votes.contains_key(*s))
            .map(String::as_str)
            .collect()
    }

    /// Whether every affected station has voted.
    pub fn has_quorum(&self) -> bool {
        self.affected_station_ids.iter().all(|s| self.votes.contains_key(s))
    }

    /// `(approve, reject)` counted over affected stations only.
    pub fn tally(&self) -> (usize, usize) {
        self.affected_station_ids
            .iter()
            .filter_map(|s| self.votes.get(s))
            .fold((0, 0), |(approve, reject), vote| match vote {
                Vote::Approve => (approve + 1, reject),
                Vote::Reject => (approve, reject + 1),
            })
    }

    /// Tally into a resolution, regardless of quorum.
    pub(crate) fn into_resolution(self) -> Resolution {
        let (approve_count, reject_count) = self.tally();
        Resolution {
            proposal_id: self.proposal_id.clone(),
            approved: majority_approves(approve_count, reject_count),
            approve_count,
            reject_count,
            request: self,
        }
    }
}

/// Outcome of a resolved proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub proposal_id: ProposalId,
    pub approved: bool,
    pub approve_count: usize,
    pub reject_count: usize,
    pub request: ConsensusRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(affected: &[&str]) -> ConsensusRequest {
        ConsensusRequest {
            proposal_id: ProposalId::new("p"),
            proposal: Proposal::prune_node("alpha:memory", "unused"),
            proposer_station_id: "alpha".into(),
            affected_station_ids: affected.iter().map(|s| s.to_string()).collect(),
            votes: BTreeMap::new(),
            created_at: 0,
        }
    }

    #[test]
    fn quorum_needs_every_affected_station() {
        let mut req = request(&["alpha", "beta"]);
        assert!(!req.has_quorum());
        assert_eq!(req.missing_voters(), vec!["alpha", "beta"]);

        req.votes.insert("alpha".into(), Vote::Approve);
        assert!(!req.has_quorum());
        assert_eq!(req.missing_voters(), vec!["beta"]);

        req.votes.insert("beta".into(), Vote::Reject);
        assert!(req.has_quorum());
    }

    #[test]
    fn outsiders_are_not_tallied() {
        let mut req = request(&["alpha"]);
        req.votes.insert("alpha".into(), Vote::Reject);
        req.votes.insert("mallory".into(), Vote::Approve);
        req.votes.insert("trent".into(), Vote::Approve);

        assert_eq!(req.tally(), (0, 1));
        assert!(!req.into_resolution().approved);
    }

    #[test]
    fn proposal_serializes_tagged() {
        let value = serde_json::to_value(Proposal::remove_edge("a->b", "stale")).unwrap();
        assert_eq!(value["changeType"], "remove_edge");
        assert_eq!(value["targetId"], "a->b");
    }
}
