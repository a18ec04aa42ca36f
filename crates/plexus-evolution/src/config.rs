//! Evolution engine configuration.

use std::time::Duration;

/// Execution-count thresholds at which the network enters each phase.
///
/// Must be ascending: `differentiation < synaptogenesis < pruning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseThresholds {
    pub differentiation: u64,
    pub synaptogenesis: u64,
    pub pruning: u64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            differentiation: 100,
            synaptogenesis: 1_000,
            pruning: 5_000,
        }
    }
}

impl PhaseThresholds {
    /// Build thresholds, returning `None` unless strictly ascending.
    pub fn new(differentiation: u64, synaptogenesis: u64, pruning: u64) -> Option<Self> {
        (differentiation < synaptogenesis && synaptogenesis < pruning).then_some(Self {
            differentiation,
            synaptogenesis,
            pruning,
        })
    }
}

/// An edge is myelinated once both values reach these minimums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MyelinationThresholds {
    pub activation_count: u64,
    pub min_weight: f64,
}

impl Default for MyelinationThresholds {
    fn default() -> Self {
        Self {
            activation_count: 50,
            min_weight: 0.7,
        }
    }
}

impl MyelinationThresholds {
    pub fn is_met(&self, activation_count: u64, weight: f64) -> bool {
        activation_count >= self.activation_count && weight >= self.min_weight
    }
}

/// Relative weight of each fitness component. Normalised on use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessWeights {
    pub success: f64,
    pub activation: f64,
    pub latency: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            success: 0.5,
            activation: 0.3,
            latency: 0.2,
        }
    }
}

/// Configuration for the evolution engine and its scheduler.
#[derive(Debug, Clone, Default)]
pub struct EvolutionConfig {
    pub phases: PhaseThresholds,
    pub myelination: MyelinationThresholds,
    pub weights: FitnessWeights,

    /// Scheduler interval. Defaults to 15 minutes.
    pub interval: Option<Duration>,
}

impl EvolutionConfig {
    /// Interval used when none is configured.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15 * 60);

    #[must_use]
    pub fn with_phases(mut self, phases: PhaseThresholds) -> Self {
        self.phases = phases;
        self
    }

    #[must_use]
    pub fn with_myelination(mut self, myelination: MyelinationThresholds) -> Self {
        self.myelination = myelination;
        self
    }

    #[must_use]
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Effective scheduler interval.
    pub fn interval(&self) -> Duration {
        self.interval.unwrap_or(Self::DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_must_ascend() {
        assert!(PhaseThresholds::new(100, 1_000, 5_000).is_some());
        assert!(PhaseThresholds::new(100, 100, 5_000).is_none());
        assert!(PhaseThresholds::new(5_000, 1_000, 100).is_none());
    }

    #[test]
    fn myelination_needs_both_minimums() {
        let t = MyelinationThresholds { activation_count: 5, min_weight: 0.5 };
        assert!(t.is_met(10, 0.6));
        assert!(t.is_met(5, 0.5));
        assert!(!t.is_met(4, 0.9));
        assert!(!t.is_met(50, 0.49));
    }

    #[test]
    fn default_interval() {
        assert_eq!(EvolutionConfig::default().interval(), Duration::from_secs(900));
        let config = EvolutionConfig::default().with_interval(Duration::from_secs(5));
        assert_eq!(config.interval(), Duration::from_secs(5));
    }
}
