//! Graph nodes: capabilities and the stations that own them.

use super::MaturationPhase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// An ability offered by a station
    Capability,
    /// A participating station
    Station,
}

/// Lifecycle status. Nodes are never deleted, only moved to `Pruned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Active,
    Dormant,
    Pruned,
}

/// A capability or station in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Globally unique identifier
    pub node_id: String,

    pub node_type: NodeType,

    /// Human-readable name
    pub name: String,

    pub description: String,

    /// Owning station
    pub station_id: String,

    pub status: NodeStatus,

    /// Composite usefulness rating, always within `[0, 100]`
    pub fitness_score: f64,

    /// Copy of the network phase, kept for display
    pub maturation_phase: MaturationPhase,

    pub capabilities: BTreeSet<String>,

    pub activation_count: u64,
    pub success_count: u64,
    pub failure_count: u64,

    /// Cumulative latency across all activations
    pub total_latency_ms: u64,

    /// Unix millis
    pub created_at: u64,
}

impl Node {
    /// Fitness assigned to a node that has never been scored.
    pub const INITIAL_FITNESS: f64 = 50.0;

    /// Create a new active node in the genesis phase.
    pub fn new(
        node_id: impl Into<String>,
        node_type: NodeType,
        name: impl Into<String>,
        station_id: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_type,
            name: name.into(),
            description: String::new(),
            station_id: station_id.into(),
            status: NodeStatus::Active,
            fitness_score: Self::INITIAL_FITNESS,
            maturation_phase: MaturationPhase::Genesis,
            capabilities: BTreeSet::new(),
            activation_count: 0,
            success_count: 0,
            failure_count: 0,
            total_latency_ms: 0,
            created_at: crate::now_millis(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Set the fitness score, clamped to `[0, 100]`.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness_score = clamp_fitness(fitness);
    }

    /// `success / (success + failure)`, or `None` before any outcome was recorded.
    pub fn success_ratio(&self) -> Option<f64> {
        let outcomes = self.success_count + self.failure_count;
        (outcomes > 0).then(|| self.success_count as f64 / outcomes as f64)
    }

    /// Mean latency per activation, or `None` if never activated.
    pub fn avg_latency_ms(&self) -> Option<f64> {
        (self.activation_count > 0)
            .then(|| self.total_latency_ms as f64 / self.activation_count as f64)
    }

    /// Record one execution of this node.
    pub fn record_execution(&mut self, success: bool, latency_ms: u64) {
        self.activation_count += 1;
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.total_latency_ms += latency_ms;
    }

    pub fn is_pruned(&self) -> bool {
        self.status == NodeStatus::Pruned
    }

    /// Fold a replicated snapshot of this node into the stored one.
    ///
    /// Counters only grow and the phase only advances, so each takes the
    /// maximum of both sides. The remaining fields, fitness included, come
    /// from whichever snapshot is at least as far along. Pruning is sticky.
    pub fn merge(&mut self, other: Node) {
        let activation_count = self.activation_count.max(other.activation_count);
        let success_count = self.success_count.max(other.success_count);
        let failure_count = self.failure_count.max(other.failure_count);
        let total_latency_ms = self.total_latency_ms.max(other.total_latency_ms);
        let maturation_phase = self.maturation_phase.max(other.maturation_phase);
        let created_at = self.created_at.min(other.created_at);
        let pruned = self.is_pruned() || other.is_pruned();

        if other.supersedes(self) {
            *self = other;
        }

        self.activation_count = activation_count;
        self.success_count = success_count;
        self.failure_count = failure_count;
        self.total_latency_ms = total_latency_ms;
        self.maturation_phase = maturation_phase;
        self.created_at = created_at;
        if pruned {
            self.status = NodeStatus::Pruned;
        }
    }

    fn supersedes(&self, stored: &Node) -> bool {
        self.maturation_phase >= stored.maturation_phase
            && self.activation_count >= stored.activation_count
            && self.success_count >= stored.success_count
            && self.failure_count >= stored.failure_count
    }
}

/// Clamp a fitness value into `[0, 100]`, mapping NaN to 0.
pub(crate) fn clamp_fitness(fitness: f64) -> f64 {
    if fitness.is_nan() {
        0.0
    } else {
        fitness.clamp(0.0, 100.0)
    }
}
