//! Node fitness scoring.
//!
//! Fitness blends three components, each normalised to `[0, 1]`:
//!
//! - **success**: `success / (success + failure)`, neutral 0.5 before any outcome
//! - **activation**: activations relative to the network mean, saturating at
//!   twice the mean (a node at the mean scores 0.5)
//! - **latency**: `mean / (mean + own)` over average latencies, so matching the
//!   peers scores 0.5 and faster nodes approach 1
//!
//! The weighted blend is scaled to `[0, 100]` and rounded to two decimals, so
//! an unchanged graph produces bit-identical scores and no writes.

use crate::config::FitnessWeights;
use plexus_graph::Node;

const NEUTRAL: f64 = 0.5;

/// Network snapshot computed once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalStats {
    pub node_count: usize,
    pub mean_activations: f64,
    /// Mean of per-node average latency over nodes that have run at least once
    pub mean_latency_ms: Option<f64>,
}

impl GlobalStats {
    pub fn from_nodes(nodes: &[Node]) -> Self {
        if nodes.is_empty() {
            return Self::default();
        }

        let total_activations: u64 = nodes.iter().map(|n| n.activation_count).sum();
        let latencies: Vec<f64> = nodes.iter().filter_map(Node::avg_latency_ms).collect();
        let mean_latency_ms =
            (!latencies.is_empty()).then(|| latencies.iter().sum::<f64>() / latencies.len() as f64);

        Self {
            node_count: nodes.len(),
            mean_activations: total_activations as f64 / nodes.len() as f64,
            mean_latency_ms,
        }
    }
}

fn activation_component(node: &Node, stats: &GlobalStats) -> f64 {
    if stats.mean_activations <= 0.0 {
        return NEUTRAL;
    }
    let relative = node.activation_count as f64 / stats.mean_activations;
    (relative / 2.0).min(1.0)
}

fn latency_component(node: &Node, stats: &GlobalStats) -> f64 {
    match (node.avg_latency_ms(), stats.mean_latency_ms) {
        (Some(own), Some(mean)) if own + mean > 0.0 => mean / (mean + own),
        (Some(_), Some(_)) => 1.0,
        _ => NEUTRAL,
    }
}

/// Compute a node's fitness in `[0, 100]`.
pub fn compute_fitness(node: &Node, stats: &GlobalStats, weights: &FitnessWeights) -> f64 {
    let total_weight = weights.success + weights.activation + weights.latency;
    if total_weight <= 0.0 {
        return Node::INITIAL_FITNESS;
    }

    let success = node.success_ratio().unwrap_or(NEUTRAL);
    let activation = activation_component(node, stats);
    let latency = latency_component(node, stats);

    let blended = (weights.success * success
        + weights.activation * activation
        + weights.latency * latency)
        / total_weight;

    ((blended * 100.0).clamp(0.0, 100.0) * 100.0).round() / 100.0
}
