//! Graph deltas - the unit of replication between stations.
//!
//! A delta bundles every change a station applied locally so peers can
//! converge on it. Deltas may arrive duplicated or out of order, so
//! application is by content: nodes and edges are upserted, myelination stays
//! sticky, removals are tolerant of unknown ids and events dedupe on their
//! content hash.

use crate::model::{Edge, EvolutionEvent, Node};
use serde::{Deserialize, Serialize};

/// A bundled description of graph changes to propagate to peers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphDelta {
    #[serde(default)]
    pub added_nodes: Vec<Node>,
    #[serde(default)]
    pub updated_nodes: Vec<Node>,
    /// Node ids to prune
    #[serde(default)]
    pub removed_nodes: Vec<String>,
    #[serde(default)]
    pub added_edges: Vec<Edge>,
    #[serde(default)]
    pub updated_edges: Vec<Edge>,
    /// Edge ids to drop
    #[serde(default)]
    pub removed_edges: Vec<String>,
    #[serde(default)]
    pub new_events: Vec<EvolutionEvent>,
    pub station_id: String,
    /// Unix millis at packaging time
    pub timestamp: u64,
}

impl GraphDelta {
    /// Create an empty delta for `station_id`, stamped now.
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            timestamp: crate::now_millis(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_updated_node(mut self, node: Node) -> Self {
        self.updated_nodes.push(node);
        self
    }

    #[must_use]
    pub fn with_updated_edge(mut self, edge: Edge) -> Self {
        self.updated_edges.push(edge);
        self
    }

    #[must_use]
    pub fn with_removed_node(mut self, node_id: impl Into<String>) -> Self {
        self.removed_nodes.push(node_id.into());
        self
    }

    #[must_use]
    pub fn with_removed_edge(mut self, edge_id: impl Into<String>) -> Self {
        self.removed_edges.push(edge_id.into());
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: EvolutionEvent) -> Self {
        self.new_events.push(event);
        self
    }

    /// True when the delta carries no change at all.
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.updated_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.updated_edges.is_empty()
            && self.removed_edges.is_empty()
            && self.new_events.is_empty()
    }

    /// Total number of changes carried.
    pub fn change_count(&self) -> usize {
        self.added_nodes.len()
            + self.updated_nodes.len()
            + self.removed_nodes.len()
            + self.added_edges.len()
            + self.updated_edges.len()
            + self.removed_edges.len()
            + self.new_events.len()
    }
}

/// Counts of records a delta application actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaApplied {
    pub nodes: usize,
    pub edges: usize,
    pub events: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeType, NodeType};

    #[test]
    fn empty_delta() {
        let delta = GraphDelta::new("alpha");
        assert!(delta.is_empty());
        assert_eq!(delta.change_count(), 0);
        assert!(delta.timestamp > 0);
    }

    #[test]
    fn builder_counts_changes() {
        let delta = GraphDelta::new("alpha")
            .with_updated_node(Node::new("alpha:memory", NodeType::Capability, "Memory", "alpha"))
            .with_updated_edge(Edge::new("alpha", "alpha:memory", EdgeType::Activation, "alpha"))
            .with_removed_node("alpha:legacy");
        assert!(!delta.is_empty());
        assert_eq!(delta.change_count(), 3);
    }

    #[test]
    fn missing_collections_deserialize_as_empty() {
        let delta: GraphDelta =
            serde_json::from_str(r#"{"stationId":"beta","timestamp":7,"removedNodes":["x"]}"#)
                .unwrap();
        assert_eq!(delta.station_id, "beta");
        assert_eq!(delta.removed_nodes, vec!["x".to_string()]);
        assert!(delta.added_nodes.is_empty());
    }
}
