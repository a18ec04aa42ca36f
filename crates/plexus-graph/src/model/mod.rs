//! Graph records shared by every Plexus crate.
//!
//! # Core Types
//!
//! - [`Node`] - a capability or a station
//! - [`Edge`] - a directed relation between two nodes
//! - [`EvolutionEvent`] - append-only audit record
//!
//! # Supporting Types
//!
//! - [`MaturationPhase`] - network-wide stage derived from the execution counter
//! - [`NodeType`], [`NodeStatus`], [`EdgeType`], [`EventType`], [`ApprovalStatus`]

mod edge;
mod event;
mod node;
mod phase;

pub use edge::{Edge, EdgeType};
pub use event::{ApprovalStatus, EventType, EvolutionEvent};
pub use node::{Node, NodeStatus, NodeType};
pub(crate) use node::clamp_fitness;
pub use phase::MaturationPhase;
