//! End-to-end station flows over HTTP.

use plexus_consensus::{ConsensusConfig, Proposal, Vote};
use plexus_evolution::EvolutionConfig;
use plexus_graph::{seed, GraphDelta, GraphStore, MemoryStore, NodeStatus};
use plexus_node::{build_router, NodeConfig, ResolveOutcome, StationNode, StationState};
use plexus_replication::{ReplicationConfig, ReplicationMode};
use serde_json::{json, Value};
use std::sync::Arc;

async fn station(
    station_id: &str,
    replication: ReplicationConfig,
) -> (Arc<MemoryStore>, Arc<StationState<MemoryStore>>) {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), station_id).await.unwrap();
    let state = StationState::new(
        station_id,
        Arc::clone(&store),
        EvolutionConfig::default(),
        ConsensusConfig::default(),
        replication,
    )
    .unwrap();
    (store, Arc::new(state))
}

async fn serve(state: Arc<StationState<MemoryStore>>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn proposal_lifecycle_over_http() {
    let (store, state) = station("alpha", ReplicationConfig::default()).await;
    let base = serve(state).await;
    let client = reqwest::Client::new();

    let created = client
        .post(format!("{base}/api/v1/proposals"))
        .json(&json!({
            "changeType": "prune_node",
            "targetId": "alpha:observer",
            "reason": "no traffic",
            "affectedStationIds": ["alpha", "beta"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let id = created.json::<Value>().await.unwrap()["proposalId"]
        .as_str()
        .unwrap()
        .to_string();

    let pending: Vec<Value> = client
        .get(format!("{base}/api/v1/proposals"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["proposerStationId"], "alpha");

    let vote = |station: &str, vote: &str| {
        client
            .post(format!("{base}/api/v1/proposals/{id}/votes"))
            .json(&json!({ "stationId": station, "vote": vote }))
            .send()
    };
    assert_eq!(vote("alpha", "approve").await.unwrap().status(), 204);

    let waiting = client
        .post(format!("{base}/api/v1/proposals/{id}/resolve"))
        .send()
        .await
        .unwrap();
    assert_eq!(waiting.status(), 202);
    assert_eq!(waiting.json::<Value>().await.unwrap()["missingVoters"], json!(["beta"]));

    // a tie does not pass
    assert_eq!(vote("beta", "reject").await.unwrap().status(), 204);
    let resolved = client
        .post(format!("{base}/api/v1/proposals/{id}/resolve"))
        .send()
        .await
        .unwrap();
    assert_eq!(resolved.status(), 200);
    let body: Value = resolved.json().await.unwrap();
    assert_eq!(body["resolution"]["approved"], false);
    assert_eq!(body["replication"]["mode"], "shared-store");

    let node = store.get_node("alpha:observer").await.unwrap().unwrap();
    assert_eq!(node.status, NodeStatus::Active);

    let gone = client
        .post(format!("{base}/api/v1/proposals/{id}/votes"))
        .json(&json!({ "stationId": "beta", "vote": "approve" }))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn health_and_sync_follow_the_store() {
    let (store, state) = station("beta", ReplicationConfig::default()).await;
    let base = serve(state).await;
    let client = reqwest::Client::new();

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.status(), 200);

    let delta = GraphDelta::new("alpha").with_removed_edge("beta:coordinator->beta:compute");
    let synced = client.post(format!("{base}/sync")).json(&delta).send().await.unwrap();
    assert_eq!(synced.status(), 200);
    assert!(store.get_edge("beta:coordinator->beta:compute").await.unwrap().is_none());

    store.set_healthy(false);
    let down = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(down.status(), 503);
}

#[tokio::test]
async fn unappliable_proposal_resolves_as_conflict() {
    let (store, state) = station("alpha", ReplicationConfig::default()).await;
    let base = serve(state).await;
    let client = reqwest::Client::new();

    let id = client
        .post(format!("{base}/api/v1/proposals"))
        .json(&json!({
            "changeType": "prune_node",
            "targetId": "alpha:ghost",
            "reason": "idle",
            "affectedStationIds": ["alpha"],
        }))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap()["proposalId"]
        .as_str()
        .unwrap()
        .to_string();
    client
        .post(format!("{base}/api/v1/proposals/{id}/votes"))
        .json(&json!({ "stationId": "alpha", "vote": "approve" }))
        .send()
        .await
        .unwrap();

    let resolved = client
        .post(format!("{base}/api/v1/proposals/{id}/resolve"))
        .send()
        .await
        .unwrap();
    assert_eq!(resolved.status(), 409);
    let body: Value = resolved.json().await.unwrap();
    assert_eq!(body["resolution"]["approved"], true);
    assert!(body["error"].as_str().unwrap().contains("alpha:ghost"));

    let events = store.list_events("alpha").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].new_state, "rejected");

    let again = client
        .post(format!("{base}/api/v1/proposals/{id}/resolve"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn evolution_run_reports_phase_transition() {
    let (store, state) = station("alpha", ReplicationConfig::default()).await;
    let base = serve(state).await;
    let client = reqwest::Client::new();

    let recorded = client
        .post(format!("{base}/api/v1/executions"))
        .json(&json!({ "nodeId": "alpha:compute", "success": true, "latencyMs": 40 }))
        .send()
        .await
        .unwrap();
    assert_eq!(recorded.status(), 204);

    let unknown = client
        .post(format!("{base}/api/v1/executions"))
        .json(&json!({ "nodeId": "alpha:nothing", "success": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), 404);

    store.set_executions(150).await;
    let report: Value = client
        .post(format!("{base}/api/v1/evolution/run"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["phase"], "differentiation");
    assert_eq!(report["phaseTransition"], json!({ "from": "genesis", "to": "differentiation" }));

    let graph: Value = client
        .get(format!("{base}/api/v1/graph"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(graph["stationId"], "alpha");
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(graph["events"].as_array().unwrap().len(), 1);
    assert_eq!(graph["events"][0]["eventType"], "phase_transition");
}

#[tokio::test]
async fn relay_carries_changes_to_peer() {
    let (beta_store, beta) = station("beta", ReplicationConfig::default()).await;
    let beta_url = serve(beta).await;

    let relayed = ReplicationConfig::default()
        .with_relay_url(beta_url)
        .with_shared_store(false);
    let (alpha_store, alpha) = station("alpha", relayed).await;

    // ship alpha's genesis graph to beta
    let mut genesis = GraphDelta::new("alpha");
    genesis.added_nodes = alpha_store.list_nodes("alpha").await.unwrap();
    genesis.added_edges = alpha_store.list_edges("alpha").await.unwrap();
    let shipped = alpha.replicate(genesis).await;
    assert_eq!(shipped.mode, ReplicationMode::Relay);
    assert!(shipped.success);
    assert_eq!(beta_store.list_nodes("alpha").await.unwrap().len(), 5);

    let id = alpha
        .propose(Proposal::prune_node("alpha:observer", "retired"), vec!["alpha".into()])
        .await;
    assert!(alpha.cast_vote(&id, "alpha", Vote::Approve).await);

    match alpha.resolve(&id).await.unwrap() {
        ResolveOutcome::Resolved { resolution, replication } => {
            assert!(resolution.approved);
            assert_eq!(replication.mode, ReplicationMode::Relay);
            assert!(replication.success);
        }
        other => panic!("expected resolution, got {:?}", other),
    }

    let pruned = beta_store.get_node("alpha:observer").await.unwrap().unwrap();
    assert_eq!(pruned.status, NodeStatus::Pruned);
    let events = beta_store.list_events("alpha").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].new_state, "approved");
    assert!(alpha.replication().offline_queue().await.is_empty());
}

#[tokio::test]
async fn station_node_seeds_persistent_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let data_dir = dir.path().to_path_buf();
    let config = NodeConfig::from_lookup(|key| match key {
        "PLEXUS_STATION_ID" => Some("gamma".to_string()),
        "PLEXUS_DATA_DIR" => Some(data_dir.display().to_string()),
        _ => None,
    })
    .unwrap();

    let node = StationNode::new(config).await.unwrap();
    let state = node.state();
    assert_eq!(state.station_id(), "gamma");
    assert_eq!(state.store().list_nodes("gamma").await.unwrap().len(), 5);
    assert_eq!(state.store().list_edges("gamma").await.unwrap().len(), 5);

    // no relay and a station-local store: changes wait offline on disk
    let result = state.replicate(GraphDelta::new("gamma").with_removed_edge("x->y")).await;
    assert_eq!(result.mode, ReplicationMode::Offline);
    assert!(dir.path().join("offline-queue.jsonl").exists());
}
