//! Applying resolved proposals to the graph.

use crate::error::{ConsensusError, Result};
use crate::proposal::{ChangeType, Resolution};
use plexus_graph::{
    ApprovalStatus, Edge, EdgeType, EventType, EvolutionEvent, GraphDelta, GraphStore, NodeStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Edge description carried in `proposed_changes` of an `add_edge` proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub source_node_id: String,
    pub target_node_id: String,
    pub edge_type: EdgeType,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Apply a resolution and record its outcome.
///
/// An approved change is written to `store` first; then a `proposal_outcome`
/// event is appended whether or not the proposal passed. The returned delta
/// carries everything written, ready for replication.
pub async fn apply_outcome<S>(store: &S, resolution: &Resolution, station_id: &str) -> Result<GraphDelta>
where
    S: GraphStore + ?Sized,
{
    let request = &resolution.request;
    let proposal = &request.proposal;
    let mut delta = GraphDelta::new(station_id);

    if resolution.approved {
        match proposal.change_type {
            ChangeType::PruneNode => {
                store.set_node_status(&proposal.target_id, NodeStatus::Pruned).await?;
                delta.removed_nodes.push(proposal.target_id.clone());
            }
            ChangeType::RemoveEdge => {
                store.remove_edge(&proposal.target_id).await?;
                delta.removed_edges.push(proposal.target_id.clone());
            }
            ChangeType::AddEdge => {
                let spec: EdgeSpec = serde_json::from_value(proposal.proposed_changes.clone())
                    .map_err(|e| ConsensusError::InvalidProposal(format!("add_edge changes: {}", e)))?;
                let mut edge =
                    Edge::new(spec.source_node_id, spec.target_node_id, spec.edge_type, station_id);
                if let Some(weight) = spec.weight {
                    edge = edge.with_weight(weight);
                }
                if edge.edge_id != proposal.target_id {
                    return Err(ConsensusError::InvalidProposal(format!(
                        "target {} does not match edge {}",
                        proposal.target_id, edge.edge_id
                    )));
                }
                store.create_edge(edge.clone()).await?;
                delta.added_edges.push(edge);
            }
        }
    }

    let status = if resolution.approved {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Rejected
    };
    let event = outcome_event(resolution, status, proposal.reason.clone(), station_id);
    store.append_event(event.clone()).await?;
    delta.new_events.push(event);

    info!(
        proposal_id = %resolution.proposal_id,
        change = proposal.change_type.as_str(),
        target = %proposal.target_id,
        approved = resolution.approved,
        "Proposal outcome applied"
    );

    Ok(delta)
}

/// Close a proposal whose change could not be applied.
///
/// Nothing in the graph changes; a `rejected` outcome event records the
/// failure so every station sees why the voted change never landed.
pub async fn record_failed_outcome<S>(
    store: &S,
    resolution: &Resolution,
    station_id: &str,
    failure: &str,
) -> Result<GraphDelta>
where
    S: GraphStore + ?Sized,
{
    let proposal = &resolution.request.proposal;
    let reason = format!("{} (not applied: {})", proposal.reason, failure);
    let event = outcome_event(resolution, ApprovalStatus::Rejected, reason, station_id);
    store.append_event(event.clone()).await?;

    warn!(
        proposal_id = %resolution.proposal_id,
        change = proposal.change_type.as_str(),
        target = %proposal.target_id,
        failure,
        "Proposal outcome could not be applied"
    );

    Ok(GraphDelta::new(station_id).with_event(event))
}

fn outcome_event(
    resolution: &Resolution,
    approval_status: ApprovalStatus,
    reason: String,
    station_id: &str,
) -> EvolutionEvent {
    let request = &resolution.request;
    let new_state = match approval_status {
        ApprovalStatus::Approved => "approved",
        _ => "rejected",
    };
    EvolutionEvent::new(
        EventType::ProposalOutcome,
        request.proposal.target_id.as_str(),
        request.proposal.change_type.as_str(),
        new_state,
        reason,
        request.proposer_station_id.as_str(),
        approval_status,
        station_id,
    )
}
