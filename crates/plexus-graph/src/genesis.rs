//! Genesis - idempotent seeding of a station's baseline topology.
//!
//! Every station starts from the same minimal capability graph: the station
//! node itself, four baseline capabilities, and the edges wiring them
//! together. Seeding runs on every process start; records that already exist
//! are skipped, so two processes seeding the same station concurrently still
//! end up with exactly one copy of each record.

use crate::error::Result;
use crate::model::{Edge, EdgeType, Node, NodeType};
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Records actually created by a [`seed`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub nodes_created: usize,
    pub edges_created: usize,
}

/// (suffix, name, description, capabilities)
const BASELINE_CAPABILITIES: [(&str, &str, &str, &[&str]); 4] = [
    (
        "coordinator",
        "Coordinator",
        "Routes incoming work to the capability best suited for it",
        &["routing", "scheduling"],
    ),
    (
        "compute",
        "Compute",
        "Executes tasks on behalf of the station",
        &["execution"],
    ),
    (
        "memory",
        "Memory",
        "Stores and recalls results across executions",
        &["storage", "recall"],
    ),
    (
        "observer",
        "Observer",
        "Watches station health and execution outcomes",
        &["health", "metrics"],
    ),
];

/// (source suffix, target suffix, type). An empty suffix is the station node.
const BASELINE_EDGES: [(&str, &str, EdgeType); 5] = [
    ("", "coordinator", EdgeType::Activation),
    ("coordinator", "compute", EdgeType::DataFlow),
    ("coordinator", "memory", EdgeType::DataFlow),
    ("compute", "memory", EdgeType::Dependency),
    ("observer", "", EdgeType::Monitoring),
];

fn baseline_id(station_id: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        station_id.to_string()
    } else {
        format!("{}:{}", station_id, suffix)
    }
}

/// Baseline nodes for `station_id`: the station itself followed by its capabilities.
pub fn baseline_nodes(station_id: &str) -> Vec<Node> {
    let station = Node::new(station_id, NodeType::Station, station_id, station_id)
        .with_description("Station root")
        .with_capabilities(["station"]);

    std::iter::once(station)
        .chain(BASELINE_CAPABILITIES.iter().map(|(suffix, name, description, caps)| {
            Node::new(baseline_id(station_id, suffix), NodeType::Capability, *name, station_id)
                .with_description(*description)
                .with_capabilities(caps.iter().copied())
        }))
        .collect()
}

/// Baseline edges for `station_id`.
pub fn baseline_edges(station_id: &str) -> Vec<Edge> {
    BASELINE_EDGES
        .iter()
        .map(|(source, target, edge_type)| {
            Edge::new(
                baseline_id(station_id, source),
                baseline_id(station_id, target),
                *edge_type,
                station_id,
            )
        })
        .collect()
}

/// Install the baseline topology for `station_id`.
///
/// "Already exists" collisions count as no-ops; any other store error is
/// returned.
pub async fn seed<S: GraphStore + ?Sized>(store: &S, station_id: &str) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for node in baseline_nodes(station_id) {
        let node_id = node.node_id.clone();
        match store.create_node(node).await {
            Ok(()) => report.nodes_created += 1,
            Err(e) if e.is_already_exists() => debug!(%node_id, "Baseline node present"),
            Err(e) => return Err(e),
        }
    }

    for edge in baseline_edges(station_id) {
        let edge_id = edge.edge_id.clone();
        match store.create_edge(edge).await {
            Ok(()) => report.edges_created += 1,
            Err(e) if e.is_already_exists() => debug!(%edge_id, "Baseline edge present"),
            Err(e) => return Err(e),
        }
    }

    info!(
        station_id,
        nodes_created = report.nodes_created,
        edges_created = report.edges_created,
        "Genesis seeding complete"
    );

    Ok(report)
}
