//! Directed edges between nodes.

use serde::{Deserialize, Serialize};

/// Kind of relation an edge records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    DataFlow,
    Dependency,
    Activation,
    Monitoring,
}

/// A directed relation between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Derived from `source -> target`; see [`Edge::derive_id`]
    pub edge_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub edge_type: EdgeType,

    /// Reinforcement strength in `[0, 1]`
    pub weight: f64,

    /// Promoted to the fast path. Never reverts.
    pub myelinated: bool,

    pub activation_count: u64,
    pub co_activation_count: u64,
    pub avg_latency_ms: f64,
    pub station_id: String,

    /// Unix millis
    pub created_at: u64,
}

impl Edge {
    /// Weight given to freshly created edges.
    pub const INITIAL_WEIGHT: f64 = 0.5;

    /// Derive the edge id from the ordered node pair.
    ///
    /// The type is not part of the key: a second edge between the same pair
    /// collides with the first one.
    pub fn derive_id(source_node_id: &str, target_node_id: &str) -> String {
        format!("{source_node_id}->{target_node_id}")
    }

    /// Create a new, non-myelinated edge.
    pub fn new(
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
        edge_type: EdgeType,
        station_id: impl Into<String>,
    ) -> Self {
        let source_node_id = source_node_id.into();
        let target_node_id = target_node_id.into();
        Self {
            edge_id: Self::derive_id(&source_node_id, &target_node_id),
            source_node_id,
            target_node_id,
            edge_type,
            weight: Self::INITIAL_WEIGHT,
            myelinated: false,
            activation_count: 0,
            co_activation_count: 0,
            avg_latency_ms: 0.0,
            station_id: station_id.into(),
            created_at: crate::now_millis(),
        }
    }

    /// Set the weight, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
        self
    }

    #[must_use]
    pub fn with_activations(mut self, activation_count: u64) -> Self {
        self.activation_count = activation_count;
        self
    }

    /// Promote the edge. Returns `true` if it was not myelinated before.
    pub fn myelinate(&mut self) -> bool {
        let changed = !self.myelinated;
        self.myelinated = true;
        changed
    }

    /// Fold another copy of this edge into `self`, keeping myelination sticky.
    pub fn merge(&mut self, other: Edge) {
        let myelinated = self.myelinated || other.myelinated;
        *self = other;
        self.myelinated = myelinated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_derived_from_pair() {
        let edge = Edge::new("a", "b", EdgeType::DataFlow, "s");
        assert_eq!(edge.edge_id, "a->b");
        assert_eq!(Edge::derive_id("b", "a"), "b->a");
    }

    #[test]
    fn different_types_share_an_id() {
        let flow = Edge::new("a", "b", EdgeType::DataFlow, "s");
        let dep = Edge::new("a", "b", EdgeType::Dependency, "s");
        assert_eq!(flow.edge_id, dep.edge_id);
    }

    #[test]
    fn weight_is_clamped() {
        assert_eq!(Edge::new("a", "b", EdgeType::Activation, "s").with_weight(1.7).weight, 1.0);
        assert_eq!(Edge::new("a", "b", EdgeType::Activation, "s").with_weight(-0.2).weight, 0.0);
    }

    #[test]
    fn myelination_is_sticky_through_merge() {
        let mut edge = Edge::new("a", "b", EdgeType::Activation, "s");
        assert!(edge.myelinate());
        assert!(!edge.myelinate());

        let stale = Edge::new("a", "b", EdgeType::Activation, "s").with_weight(0.9);
        edge.merge(stale);
        assert!(edge.myelinated);
        assert_eq!(edge.weight, 0.9);
    }
}
