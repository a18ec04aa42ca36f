//! Append-only evolution audit events.

use serde::{Deserialize, Serialize};

/// What an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The network moved to a new maturation phase
    PhaseTransition,
    /// A consensus proposal was resolved
    ProposalOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    /// Derived facts that never go through consensus
    AutoApproved,
}

impl EventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PhaseTransition => "phase_transition",
            Self::ProposalOutcome => "proposal_outcome",
        }
    }
}

/// Immutable audit record of a phase transition or proposal outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionEvent {
    /// Content hash; makes appends idempotent when events are replicated
    pub event_id: String,
    pub event_type: EventType,
    pub target_id: String,
    pub previous_state: String,
    pub new_state: String,
    pub reason: String,
    pub triggered_by: String,
    pub requires_approval: bool,
    pub approval_status: ApprovalStatus,
    pub station_id: String,
    pub created_at: u64,
}

impl EvolutionEvent {
    /// Build an event, deriving its id from the content.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_type: EventType,
        target_id: impl Into<String>,
        previous_state: impl Into<String>,
        new_state: impl Into<String>,
        reason: impl Into<String>,
        triggered_by: impl Into<String>,
        approval_status: ApprovalStatus,
        station_id: impl Into<String>,
    ) -> Self {
        let mut event = Self {
            event_id: String::new(),
            event_type,
            target_id: target_id.into(),
            previous_state: previous_state.into(),
            new_state: new_state.into(),
            reason: reason.into(),
            triggered_by: triggered_by.into(),
            requires_approval: approval_status != ApprovalStatus::AutoApproved,
            approval_status,
            station_id: station_id.into(),
            created_at: crate::now_millis(),
        };
        event.event_id = event.content_id();
        event
    }

    /// BLAKE3 over the identifying fields, hex encoded.
    pub fn content_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for field in [
            self.event_type.as_str(),
            self.target_id.as_str(),
            self.previous_state.as_str(),
            self.new_state.as_str(),
            self.reason.as_str(),
            self.triggered_by.as_str(),
            self.station_id.as_str(),
        ] {
            hasher.update(field.as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(&self.created_at.to_be_bytes());
        hex::encode(&hasher.finalize().as_bytes()[..16])
    }
}
