//! Replication modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Consistency strategy selected for one delta, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplicationMode {
    /// The shared live store is healthy and fans out on its own
    SharedStore,
    /// Forward through the relay orchestrator
    Relay,
    /// Queue locally until connectivity returns
    Offline,
}

impl ReplicationMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SharedStore => "shared-store",
            Self::Relay => "relay",
            Self::Offline => "offline",
        }
    }

    pub const fn is_online(&self) -> bool {
        !matches!(self, Self::Offline)
    }
}

impl fmt::Display for ReplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
