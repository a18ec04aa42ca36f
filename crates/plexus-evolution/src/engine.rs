//! The fitness & phase evolution engine.

use crate::config::EvolutionConfig;
use crate::fitness::{compute_fitness, GlobalStats};
use crate::phase::determine_phase;
use plexus_graph::{
    ApprovalStatus, EventType, EvolutionEvent, GraphDelta, GraphStore, MaturationPhase, Node,
    Result,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Target id recorded on phase-transition events.
pub const NETWORK_TARGET: &str = "network";

/// `triggered_by` recorded on events the engine appends.
pub const CYCLE_TRIGGER: &str = "evolution_cycle";

/// Scores closer than this are treated as unchanged.
const FITNESS_EPSILON: f64 = 1e-6;

/// A move between maturation phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub from: MaturationPhase,
    pub to: MaturationPhase,
}

/// Outcome of a single evolution cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub station_id: String,
    pub phase: MaturationPhase,
    pub total_executions: u64,
    pub nodes_updated: usize,
    pub edges_updated: usize,
    pub phase_transition: Option<PhaseTransition>,

    /// Every change written this cycle, ready for replication
    #[serde(skip)]
    pub delta: GraphDelta,
}

/// Rescores the graph and advances the maturation phase.
///
/// Writes are conditional: a node is patched only when its fitness or its
/// copy of the phase changed, and only non-myelinated edges are touched.
/// Concurrent cycles on different stations are last-write-wins.
pub struct EvolutionEngine<S> {
    store: Arc<S>,
    config: EvolutionConfig,
}

impl<S: GraphStore> EvolutionEngine<S> {
    pub fn new(store: Arc<S>, config: EvolutionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one evolution cycle for `station_id`.
    ///
    /// Errors abort the cycle where they occur; records already written stay
    /// written and the next cycle reconciles the rest.
    pub async fn run_evolution_cycle(&self, station_id: &str) -> Result<CycleReport> {
        let nodes = self.store.list_nodes(station_id).await?;
        let edges = self.store.list_edges(station_id).await?;
        let total_executions = self.store.count_executions(station_id).await?;

        let phase = determine_phase(total_executions, &self.config.phases);
        let previous = self.last_observed_phase(station_id, &nodes).await?;
        // fitness peers are this station's nodes; only the phase is network-wide
        let stats = GlobalStats::from_nodes(&nodes);
        let mut delta = GraphDelta::new(station_id);

        for node in &nodes {
            let fitness = compute_fitness(node, &stats, &self.config.weights);
            let fitness_changed = (fitness - node.fitness_score).abs() > FITNESS_EPSILON;
            if !fitness_changed && node.maturation_phase == phase {
                continue;
            }

            self.store.patch_node_fitness(&node.node_id, fitness, phase).await?;
            trace!(
                node_id = %node.node_id,
                from = node.fitness_score,
                to = fitness,
                %phase,
                "Node rescored"
            );

            let mut updated = node.clone();
            updated.set_fitness(fitness);
            updated.maturation_phase = phase;
            delta.updated_nodes.push(updated);
        }

        let myelination = self.config.myelination;
        for edge in edges
            .iter()
            .filter(|e| !e.myelinated && myelination.is_met(e.activation_count, e.weight))
        {
            self.store.myelinate_edge(&edge.edge_id).await?;
            debug!(
                edge_id = %edge.edge_id,
                activations = edge.activation_count,
                weight = edge.weight,
                "Edge myelinated"
            );

            let mut updated = edge.clone();
            updated.myelinate();
            delta.updated_edges.push(updated);
        }

        let phase_transition = if previous != phase {
            let event = EvolutionEvent::new(
                EventType::PhaseTransition,
                NETWORK_TARGET,
                previous.as_str(),
                phase.as_str(),
                format!("network executions reached {}", total_executions),
                CYCLE_TRIGGER,
                ApprovalStatus::AutoApproved,
                station_id,
            );
            self.store.append_event(event.clone()).await?;
            delta.new_events.push(event);

            info!(station_id, from = %previous, to = %phase, total_executions, "Phase transition");
            Some(PhaseTransition { from: previous, to: phase })
        } else {
            None
        };

        let report = CycleReport {
            station_id: station_id.to_string(),
            phase,
            total_executions,
            nodes_updated: delta.updated_nodes.len(),
            edges_updated: delta.updated_edges.len(),
            phase_transition,
            delta,
        };

        debug!(
            station_id,
            %phase,
            nodes_updated = report.nodes_updated,
            edges_updated = report.edges_updated,
            "Evolution cycle complete"
        );

        Ok(report)
    }

    /// Phase most recently observed on the graph.
    ///
    /// The latest logged transition wins. Without one, the lowest phase
    /// stamped on any node is used, so a cycle that died between patching
    /// nodes and logging still gets its transition logged next time.
    async fn last_observed_phase(&self, station_id: &str, nodes: &[Node]) -> Result<MaturationPhase> {
        let events = self.store.list_events(station_id).await?;
        let logged = events
            .iter()
            .rev()
            .filter(|e| e.event_type == EventType::PhaseTransition)
            .find_map(|e| e.new_state.parse::<MaturationPhase>().ok());

        if let Some(phase) = logged {
            return Ok(phase);
        }

        Ok(nodes
            .iter()
            .map(|n| n.maturation_phase)
            .min()
            .unwrap_or_default())
    }
}
