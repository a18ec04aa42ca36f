//! Plexus Evolution - fitness scoring and network maturation
//!
//! Each cycle rescores the capability graph from observed usage and advances
//! the network through its maturation phases:
//!
//! ```text
//! executions:  0 ──── differentiation ──── synaptogenesis ──── pruning ────▶
//! phase:       genesis │ differentiation  │ synaptogenesis   │ pruning
//! ```
//!
//! # Cycle
//!
//! 1. Read nodes, edges and the network-wide execution counter
//! 2. Derive the phase from the counter alone (every station agrees without talking)
//! 3. Rescore each node; write back only what changed
//! 4. Myelinate hot edges (one way, never reverted)
//! 5. Log exactly one `phase_transition` event when the phase moves
//!
//! The [`EvolutionScheduler`] runs cycles on a fixed interval and swallows
//! (logs) cycle errors so one bad cycle never stops the next.

mod config;
mod engine;
mod fitness;
mod phase;
mod scheduler;

pub use config::{EvolutionConfig, FitnessWeights, MyelinationThresholds, PhaseThresholds};
pub use engine::{CycleReport, EvolutionEngine, PhaseTransition, CYCLE_TRIGGER, NETWORK_TARGET};
pub use fitness::{compute_fitness, GlobalStats};
pub use phase::determine_phase;
pub use scheduler::{EvolutionScheduler, SchedulerStats};
