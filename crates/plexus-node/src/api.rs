//! HTTP API for a station.

use crate::error::Error;
use crate::node::{ResolveOutcome, StationState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use plexus_consensus::{ConsensusRequest, Proposal, ProposalId, Resolution, Vote};
use plexus_evolution::CycleReport;
use plexus_graph::{DeltaApplied, Edge, EvolutionEvent, GraphDelta, GraphStore, Node};
use plexus_replication::ReplicationResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

type AppState<S> = Arc<StationState<S>>;

/// Build the API router.
pub fn build_router<S: GraphStore + 'static>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::<S>))
        // Relayed deltas from peers
        .route("/sync", post(sync_delta::<S>))
        // Graph
        .route("/api/v1/graph", get(get_graph::<S>))
        .route("/api/v1/executions", post(record_execution::<S>))
        // Consensus
        .route("/api/v1/proposals", get(list_proposals::<S>).post(create_proposal::<S>))
        .route("/api/v1/proposals/:id/votes", post(cast_vote::<S>))
        .route("/api/v1/proposals/:id/resolve", post(resolve_proposal::<S>))
        // Evolution
        .route("/api/v1/evolution/run", post(run_evolution::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn failure(e: impl Into<Error>) -> StatusCode {
    let e = e.into();
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "Request failed");
    }
    status
}

// --- Health ---

async fn health<S: GraphStore + 'static>(State(state): State<AppState<S>>) -> StatusCode {
    if state.store().is_healthy().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

// --- Sync ---

async fn sync_delta<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Json(delta): Json<GraphDelta>,
) -> Result<Json<DeltaApplied>, StatusCode> {
    let applied = state.store().apply_delta(&delta).await.map_err(failure)?;
    tracing::debug!(from = %delta.station_id, ?applied, "Applied relayed delta");
    Ok(Json(applied))
}

// --- Graph ---

#[derive(Debug, Deserialize)]
struct GraphQuery {
    station: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphView {
    station_id: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    events: Vec<EvolutionEvent>,
}

async fn get_graph<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<GraphView>, StatusCode> {
    let station_id = query.station.unwrap_or_else(|| state.station_id().to_string());
    let store = state.store();
    Ok(Json(GraphView {
        nodes: store.list_nodes(&station_id).await.map_err(failure)?,
        edges: store.list_edges(&station_id).await.map_err(failure)?,
        events: store.list_events(&station_id).await.map_err(failure)?,
        station_id,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionRequest {
    node_id: String,
    success: bool,
    #[serde(default)]
    latency_ms: u64,
}

async fn record_execution<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<ExecutionRequest>,
) -> Result<StatusCode, StatusCode> {
    state
        .store()
        .record_execution(&req.node_id, req.success, req.latency_ms)
        .await
        .map_err(failure)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Consensus ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProposalRequest {
    #[serde(flatten)]
    proposal: Proposal,
    affected_station_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateProposalResponse {
    proposal_id: ProposalId,
}

async fn create_proposal<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<CreateProposalRequest>,
) -> (StatusCode, Json<CreateProposalResponse>) {
    let proposal_id = state.propose(req.proposal, req.affected_station_ids).await;
    (StatusCode::CREATED, Json(CreateProposalResponse { proposal_id }))
}

async fn list_proposals<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<Vec<ConsensusRequest>> {
    Json(state.list_pending().await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    station_id: String,
    vote: Vote,
}

async fn cast_vote<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> StatusCode {
    if state.cast_vote(&ProposalId::new(id), &req.station_id, req.vote).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedResponse {
    resolution: Resolution,
    replication: ReplicationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailedResponse {
    resolution: Resolution,
    error: String,
    replication: ReplicationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingResponse {
    missing_voters: Vec<String>,
}

async fn resolve_proposal<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Response, StatusCode> {
    let outcome = state.resolve(&ProposalId::new(id)).await.map_err(failure)?;
    Ok(match outcome {
        ResolveOutcome::Unknown => StatusCode::NOT_FOUND.into_response(),
        ResolveOutcome::Pending { missing_voters } => {
            (StatusCode::ACCEPTED, Json(PendingResponse { missing_voters })).into_response()
        }
        ResolveOutcome::Resolved {
            resolution,
            replication,
        } => Json(ResolvedResponse {
            resolution,
            replication,
        })
        .into_response(),
        ResolveOutcome::Failed {
            resolution,
            error,
            replication,
        } => (
            StatusCode::CONFLICT,
            Json(FailedResponse {
                resolution,
                error,
                replication,
            }),
        )
            .into_response(),
    })
}

// --- Evolution ---

async fn run_evolution<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<CycleReport>, StatusCode> {
    Ok(Json(state.run_cycle().await.map_err(failure)?))
}
