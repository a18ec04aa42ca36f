//! Plexus Graph - the shared capability graph
//!
//! Every station in a Plexus network describes what it can do as a small
//! directed graph: **station** nodes own **capability** nodes, and edges record
//! how capabilities feed, depend on, activate or monitor each other.
//!
//! # Architecture
//!
//! - **Model**: [`Node`], [`Edge`], [`EvolutionEvent`] and the network-wide
//!   [`MaturationPhase`]
//! - **Delta**: [`GraphDelta`], the unit of replication between stations
//! - **Store**: the [`GraphStore`] contract plus [`MemoryStore`] and
//!   RocksDB-backed [`RocksStore`] implementations
//! - **Genesis**: idempotent seeding of a station's baseline topology
//!
//! # Invariants
//!
//! - `node_id` is unique and nodes are never hard-deleted (pruning is a status)
//! - `fitness_score` stays within `[0, 100]`
//! - an edge id is derived from its ordered `(source, target)` pair, so at most
//!   one edge exists per pair regardless of type
//! - `myelinated` only ever moves from `false` to `true`
//! - events are append-only

pub mod delta;
pub mod error;
pub mod genesis;
pub mod model;
pub mod store;

pub use delta::{DeltaApplied, GraphDelta};
pub use error::{GraphError, Result};
pub use genesis::{seed, SeedReport};
pub use model::{
    ApprovalStatus, Edge, EdgeType, EventType, EvolutionEvent, MaturationPhase, Node, NodeStatus,
    NodeType,
};
pub use store::{GraphStore, MemoryStore, RocksStore};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
