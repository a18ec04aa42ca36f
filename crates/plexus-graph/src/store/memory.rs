//! In-memory graph store.

use super::GraphStore;
use crate::error::{GraphError, Result};
use crate::model::{clamp_fitness, Edge, EvolutionEvent, MaturationPhase, Node, NodeStatus};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Collections {
    nodes: HashMap<String, Node>,
    edges: HashMap<String, Edge>,
    events: Vec<EvolutionEvent>,
    event_ids: HashSet<String>,
    executions: u64,
}

/// Process-local store holding a single network.
///
/// While marked unhealthy every operation fails with
/// [`GraphError::Unavailable`], which models a shared store that dropped off
/// the network.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    healthy: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collections::default()),
            healthy: AtomicBool::new(true),
        }
    }

    /// Flip the health switch.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Overwrite the network execution counter.
    pub async fn set_executions(&self, total: u64) {
        self.inner.write().await.executions = total;
    }

    fn ensure_available(&self) -> Result<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GraphError::Unavailable("memory store marked unhealthy".into()))
        }
    }
}

fn node_not_found(id: &str) -> GraphError {
    GraphError::NotFound { kind: "node", id: id.to_string() }
}

fn edge_not_found(id: &str) -> GraphError {
    GraphError::NotFound { kind: "edge", id: id.to_string() }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn list_nodes(&self, station_id: &str) -> Result<Vec<Node>> {
        self.ensure_available()?;
        let inner = self.inner.read().await;
        let mut nodes: Vec<Node> = inner
            .nodes
            .values()
            .filter(|n| n.station_id == station_id)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        Ok(nodes)
    }

    async fn list_edges(&self, station_id: &str) -> Result<Vec<Edge>> {
        self.ensure_available()?;
        let inner = self.inner.read().await;
        let mut edges: Vec<Edge> = inner
            .edges
            .values()
            .filter(|e| e.station_id == station_id)
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.edge_id.cmp(&b.edge_id));
        Ok(edges)
    }

    async fn list_events(&self, station_id: &str) -> Result<Vec<EvolutionEvent>> {
        self.ensure_available()?;
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| e.station_id == station_id)
            .cloned()
            .collect())
    }

    async fn count_executions(&self, _station_id: &str) -> Result<u64> {
        self.ensure_available()?;
        Ok(self.inner.read().await.executions)
    }

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>> {
        self.ensure_available()?;
        Ok(self.inner.read().await.nodes.get(node_id).cloned())
    }

    async fn get_edge(&self, edge_id: &str) -> Result<Option<Edge>> {
        self.ensure_available()?;
        Ok(self.inner.read().await.edges.get(edge_id).cloned())
    }

    async fn create_node(&self, node: Node) -> Result<()> {
        self.ensure_available()?;
        let mut inner = self.inner.write().await;
        if inner.nodes.contains_key(&node.node_id) {
            return Err(GraphError::AlreadyExists { kind: "node", id: node.node_id });
        }
        inner.nodes.insert(node.node_id.clone(), node);
        Ok(())
    }

    async fn put_node(&self, node: Node) -> Result<()> {
        self.ensure_available()?;
        self.inner.write().await.nodes.insert(node.node_id.clone(), node);
        Ok(())
    }

    async fn patch_node_fitness(
        &self,
        node_id: &str,
        fitness: f64,
        phase: MaturationPhase,
    ) -> Result<()> {
        self.ensure_available()?;
        let mut inner = self.inner.write().await;
        let node = inner.nodes.get_mut(node_id).ok_or_else(|| node_not_found(node_id))?;
        node.fitness_score = clamp_fitness(fitness);
        node.maturation_phase = phase;
        Ok(())
    }

    async fn set_node_status(&self, node_id: &str, status: NodeStatus) -> Result<()> {
        self.ensure_available()?;
        let mut inner = self.inner.write().await;
        let node = inner.nodes.get_mut(node_id).ok_or_else(|| node_not_found(node_id))?;
        node.status = status;
        Ok(())
    }

    async fn create_edge(&self, edge: Edge) -> Result<()> {
        self.ensure_available()?;
        let mut inner = self.inner.write().await;
        if inner.edges.contains_key(&edge.edge_id) {
            return Err(GraphError::AlreadyExists { kind: "edge", id: edge.edge_id });
        }
        inner.edges.insert(edge.edge_id.clone(), edge);
        Ok(())
    }

    async fn put_edge(&self, edge: Edge) -> Result<()> {
        self.ensure_available()?;
        self.inner.write().await.edges.insert(edge.edge_id.clone(), edge);
        Ok(())
    }

    async fn myelinate_edge(&self, edge_id: &str) -> Result<()> {
        self.ensure_available()?;
        let mut inner = self.inner.write().await;
        let edge = inner.edges.get_mut(edge_id).ok_or_else(|| edge_not_found(edge_id))?;
        edge.myelinate();
        Ok(())
    }

    async fn remove_edge(&self, edge_id: &str) -> Result<()> {
        self.ensure_available()?;
        self.inner
            .write()
            .await
            .edges
            .remove(edge_id)
            .map(|_| ())
            .ok_or_else(|| edge_not_found(edge_id))
    }

    async fn append_event(&self, event: EvolutionEvent) -> Result<()> {
        self.ensure_available()?;
        let mut inner = self.inner.write().await;
        if !inner.event_ids.insert(event.event_id.clone()) {
            return Err(GraphError::AlreadyExists { kind: "event", id: event.event_id });
        }
        inner.events.push(event);
        Ok(())
    }

    async fn record_execution(&self, node_id: &str, success: bool, latency_ms: u64) -> Result<()> {
        self.ensure_available()?;
        let mut inner = self.inner.write().await;
        inner
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| node_not_found(node_id))?
            .record_execution(success, latency_ms);
        inner.executions += 1;
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}
