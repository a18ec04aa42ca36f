//! Plexus Replication - tiered propagation of graph deltas
//!
//! Every locally applied change is packaged as a [`GraphDelta`] and handed to
//! the [`ReplicationCoordinator`], which picks the best channel that is
//! reachable *right now*:
//!
//! ```text
//! ┌──────────────┐ healthy ┌───────────────────────────────────────────┐
//! │ shared store │────────▶│ shared-store: fan-out by the store itself │
//! └──────┬───────┘         └───────────────────────────────────────────┘
//!        │ down
//! ┌──────▼───────┐ healthy ┌───────────────────────────────────────────┐
//! │ relay /health│────────▶│ relay: POST /sync with the whole delta    │
//! └──────┬───────┘         └───────────────────────────────────────────┘
//!        │ down
//! ┌──────▼───────┐
//! │ offline queue│  drained on the next non-offline success
//! └──────────────┘
//! ```
//!
//! Connectivity is re-probed on every call. Probes and relay calls are bounded
//! by timeouts and never surface errors; they only degrade the mode.
//! Deltas carry no sequence numbers, so receivers apply them by content.
//!
//! [`GraphDelta`]: plexus_graph::GraphDelta

mod coordinator;
mod error;
mod mode;
mod queue;
mod relay;

pub use coordinator::{ReplicationConfig, ReplicationCoordinator, ReplicationResult};
pub use error::{ReplicationError, Result};
pub use mode::ReplicationMode;
pub use queue::OfflineQueue;
pub use relay::{HttpRelay, Relay};
