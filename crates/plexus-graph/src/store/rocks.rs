//! Persistent graph store using RocksDB.
//!
//! Key layout:
//!
//! ```text
//! node:{node_id}                      -> Node (JSON)
//! edge:{edge_id}                      -> Edge (JSON)
//! event:{created_at:020}:{event_id}   -> EvolutionEvent (JSON)
//! eventid:{event_id}                  -> marker
//! counter:executions                  -> u64 (big endian)
//! ```

use super::GraphStore;
use crate::error::{GraphError, Result};
use crate::model::{clamp_fitness, Edge, EvolutionEvent, MaturationPhase, Node, NodeStatus};
use async_trait::async_trait;
use rocksdb::{Options, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio::sync::Mutex;

const EXECUTIONS_KEY: &[u8] = b"counter:executions";

/// RocksDB-backed graph store.
///
/// Read-modify-write sequences are serialised through a single write mutex,
/// which makes create-if-absent atomic for every task sharing this handle.
pub struct RocksStore {
    db: DB,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.db.put(key.as_bytes(), serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn scan_prefix<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let prefix = prefix.as_bytes();
        let mut values = Vec::new();

        for item in self.db.prefix_iterator(prefix) {
            let (key, value) = item?;
            if key.starts_with(prefix) {
                values.push(serde_json::from_slice(&value)?);
            } else {
                break;
            }
        }

        Ok(values)
    }

    fn executions(&self) -> Result<u64> {
        match self.db.get(EXECUTIONS_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| GraphError::Storage("corrupt execution counter".into()))?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn load_node(&self, node_id: &str) -> Result<Node> {
        self.get_json(&node_key(node_id))?
            .ok_or_else(|| GraphError::NotFound { kind: "node", id: node_id.to_string() })
    }

    fn load_edge(&self, edge_id: &str) -> Result<Edge> {
        self.get_json(&edge_key(edge_id))?
            .ok_or_else(|| GraphError::NotFound { kind: "edge", id: edge_id.to_string() })
    }
}

fn node_key(id: &str) -> String {
    format!("node:{}", id)
}

fn edge_key(id: &str) -> String {
    format!("edge:{}", id)
}

#[async_trait]
impl GraphStore for RocksStore {
    async fn list_nodes(&self, station_id: &str) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self.scan_prefix("node:")?;
        nodes.retain(|n| n.station_id == station_id);
        Ok(nodes)
    }

    async fn list_edges(&self, station_id: &str) -> Result<Vec<Edge>> {
        let mut edges: Vec<Edge> = self.scan_prefix("edge:")?;
        edges.retain(|e| e.station_id == station_id);
        Ok(edges)
    }

    async fn list_events(&self, station_id: &str) -> Result<Vec<EvolutionEvent>> {
        let mut events: Vec<EvolutionEvent> = self.scan_prefix("event:")?;
        events.retain(|e| e.station_id == station_id);
        Ok(events)
    }

    async fn count_executions(&self, _station_id: &str) -> Result<u64> {
        self.executions()
    }

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>> {
        self.get_json(&node_key(node_id))
    }

    async fn get_edge(&self, edge_id: &str) -> Result<Option<Edge>> {
        self.get_json(&edge_key(edge_id))
    }

    async fn create_node(&self, node: Node) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = node_key(&node.node_id);
        if self.db.get(key.as_bytes())?.is_some() {
            return Err(GraphError::AlreadyExists { kind: "node", id: node.node_id });
        }
        self.put_json(&key, &node)
    }

    async fn put_node(&self, node: Node) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.put_json(&node_key(&node.node_id), &node)
    }

    async fn patch_node_fitness(
        &self,
        node_id: &str,
        fitness: f64,
        phase: MaturationPhase,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut node = self.load_node(node_id)?;
        node.fitness_score = clamp_fitness(fitness);
        node.maturation_phase = phase;
        self.put_json(&node_key(node_id), &node)
    }

    async fn set_node_status(&self, node_id: &str, status: NodeStatus) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut node = self.load_node(node_id)?;
        node.status = status;
        self.put_json(&node_key(node_id), &node)
    }

    async fn create_edge(&self, edge: Edge) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = edge_key(&edge.edge_id);
        if self.db.get(key.as_bytes())?.is_some() {
            return Err(GraphError::AlreadyExists { kind: "edge", id: edge.edge_id });
        }
        self.put_json(&key, &edge)
    }

    async fn put_edge(&self, edge: Edge) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.put_json(&edge_key(&edge.edge_id), &edge)
    }

    async fn myelinate_edge(&self, edge_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut edge = self.load_edge(edge_id)?;
        if edge.myelinate() {
            self.put_json(&edge_key(edge_id), &edge)?;
        }
        Ok(())
    }

    async fn remove_edge(&self, edge_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.load_edge(edge_id)?;
        self.db.delete(edge_key(edge_id).as_bytes())?;
        Ok(())
    }

    async fn append_event(&self, event: EvolutionEvent) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let marker = format!("eventid:{}", event.event_id);
        if self.db.get(marker.as_bytes())?.is_some() {
            return Err(GraphError::AlreadyExists { kind: "event", id: event.event_id });
        }
        let key = format!("event:{:020}:{}", event.created_at, event.event_id);
        self.put_json(&key, &event)?;
        self.db.put(marker.as_bytes(), b"1")?;
        Ok(())
    }

    async fn record_execution(&self, node_id: &str, success: bool, latency_ms: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut node = self.load_node(node_id)?;
        node.record_execution(success, latency_ms);
        self.put_json(&node_key(node_id), &node)?;

        let total = self.executions()? + 1;
        self.db.put(EXECUTIONS_KEY, total.to_be_bytes())?;
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.db.get(EXECUTIONS_KEY).is_ok()
    }
}
