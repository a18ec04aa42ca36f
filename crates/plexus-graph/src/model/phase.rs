//! Network maturation phases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network-wide maturation stage.
///
/// Ordered: `Genesis < Differentiation < Synaptogenesis < Pruning`. The phase is
/// a function of the network's cumulative execution count only, so every
/// station derives the same value without coordinating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturationPhase {
    /// Freshly seeded network
    #[default]
    Genesis,
    /// Capabilities start to specialise
    Differentiation,
    /// Connections between capabilities are formed and reinforced
    Synaptogenesis,
    /// Weak structure is proposed for removal
    Pruning,
}

impl MaturationPhase {
    /// All phases in ascending order.
    pub const ALL: [MaturationPhase; 4] = [
        Self::Genesis,
        Self::Differentiation,
        Self::Synaptogenesis,
        Self::Pruning,
    ];

    /// Stable lowercase name used in events and on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Genesis => "genesis",
            Self::Differentiation => "differentiation",
            Self::Synaptogenesis => "synaptogenesis",
            Self::Pruning => "pruning",
        }
    }
}

impl fmt::Display for MaturationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaturationPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown maturation phase: {s}"))
    }
}
