//! The graph store contract.
//!
//! The store owns the node, edge and event collections and the network-wide
//! execution counter. Plexus never holds a long-lived lock on it: each cycle
//! reads, then performs conditional writes.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`] - process-local maps, with a health switch so callers can
//!   exercise degraded replication paths
//! - [`RocksStore`] - RocksDB-backed persistent storage

mod memory;
mod rocks;

pub use memory::MemoryStore;
pub use rocks::RocksStore;

use crate::delta::{DeltaApplied, GraphDelta};
use crate::error::Result;
use crate::model::{Edge, EvolutionEvent, MaturationPhase, Node, NodeStatus};
use async_trait::async_trait;
use tracing::debug;

/// Read/write operations Plexus requires of a graph store.
///
/// Listing operations are scoped to the records owned by `station_id`;
/// [`count_executions`](GraphStore::count_executions) is network-wide so every
/// station derives the same maturation phase.
///
/// Creates must fail with [`GraphError::AlreadyExists`](crate::GraphError) on
/// key collisions and nothing else, so idempotent reseeding can tell
/// collisions from real failures.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Nodes owned by `station_id`, ordered by id.
    async fn list_nodes(&self, station_id: &str) -> Result<Vec<Node>>;

    /// Edges owned by `station_id`, ordered by id.
    async fn list_edges(&self, station_id: &str) -> Result<Vec<Edge>>;

    /// Events appended by `station_id`, oldest first.
    async fn list_events(&self, station_id: &str) -> Result<Vec<EvolutionEvent>>;

    /// Total executions recorded across the station's whole network.
    async fn count_executions(&self, station_id: &str) -> Result<u64>;

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>>;

    async fn get_edge(&self, edge_id: &str) -> Result<Option<Edge>>;

    /// Insert a node if its id is free.
    async fn create_node(&self, node: Node) -> Result<()>;

    /// Insert or overwrite a node.
    async fn put_node(&self, node: Node) -> Result<()>;

    async fn patch_node_fitness(
        &self,
        node_id: &str,
        fitness: f64,
        phase: MaturationPhase,
    ) -> Result<()>;

    async fn set_node_status(&self, node_id: &str, status: NodeStatus) -> Result<()>;

    /// Insert an edge if its id is free.
    async fn create_edge(&self, edge: Edge) -> Result<()>;

    /// Insert or overwrite an edge.
    async fn put_edge(&self, edge: Edge) -> Result<()>;

    /// Set `myelinated = true`. Idempotent.
    async fn myelinate_edge(&self, edge_id: &str) -> Result<()>;

    async fn remove_edge(&self, edge_id: &str) -> Result<()>;

    /// Append an event. Fails with `AlreadyExists` for a known `event_id`.
    async fn append_event(&self, event: EvolutionEvent) -> Result<()>;

    /// Count one execution of `node_id` and bump the network counter.
    async fn record_execution(&self, node_id: &str, success: bool, latency_ms: u64) -> Result<()>;

    /// Liveness of the store itself.
    async fn is_healthy(&self) -> bool;

    /// Apply a replicated delta by content.
    ///
    /// Safe to repeat and to run out of order. Nodes and edges are merged
    /// into what is stored, so an older snapshot never rolls back counters,
    /// phase, pruning or myelination. Unknown removals are ignored and
    /// duplicate events are skipped.
    async fn apply_delta(&self, delta: &GraphDelta) -> Result<DeltaApplied> {
        let mut applied = DeltaApplied::default();

        for node in delta.added_nodes.iter().chain(&delta.updated_nodes) {
            let merged = match self.get_node(&node.node_id).await? {
                Some(mut existing) => {
                    existing.merge(node.clone());
                    existing
                }
                None => node.clone(),
            };
            self.put_node(merged).await?;
            applied.nodes += 1;
        }

        for node_id in &delta.removed_nodes {
            match self.set_node_status(node_id, NodeStatus::Pruned).await {
                Ok(()) => applied.nodes += 1,
                Err(e) if e.is_not_found() => debug!(node_id, "Prune of unknown node skipped"),
                Err(e) => return Err(e),
            }
        }

        for edge in delta.added_edges.iter().chain(&delta.updated_edges) {
            let merged = match self.get_edge(&edge.edge_id).await? {
                Some(mut existing) => {
                    existing.merge(edge.clone());
                    existing
                }
                None => edge.clone(),
            };
            self.put_edge(merged).await?;
            applied.edges += 1;
        }

        for edge_id in &delta.removed_edges {
            match self.remove_edge(edge_id).await {
                Ok(()) => applied.edges += 1,
                Err(e) if e.is_not_found() => debug!(edge_id, "Removal of unknown edge skipped"),
                Err(e) => return Err(e),
            }
        }

        for event in &delta.new_events {
            match self.append_event(event.clone()).await {
                Ok(()) => applied.events += 1,
                Err(e) if e.is_already_exists() => {}
                Err(e) => return Err(e),
            }
        }

        debug!(
            station_id = %delta.station_id,
            nodes = applied.nodes,
            edges = applied.edges,
            events = applied.events,
            "Applied graph delta"
        );

        Ok(applied)
    }
}
