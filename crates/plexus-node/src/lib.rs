//! Plexus Node - one station of the capability mesh.
//!
//! A station process owns its graph store, runs the evolution scheduler,
//! hosts the consensus coordinator for the proposals it raises and accepts
//! relayed deltas from peers. Everything it writes is handed to the
//! replication coordinator.

mod api;
mod config;
mod error;
mod node;

pub use api::build_router;
pub use config::NodeConfig;
pub use error::{Error, Result};
pub use node::{ResolveOutcome, StationNode, StationState};
