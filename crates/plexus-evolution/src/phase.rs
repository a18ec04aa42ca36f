//! Maturation phase determination.

use crate::config::PhaseThresholds;
use plexus_graph::MaturationPhase;

/// Derive the network phase from the cumulative execution count.
///
/// Pure and monotonic non-decreasing in `total_executions`.
///
/// # Examples
///
/// ```
/// use plexus_evolution::{determine_phase, PhaseThresholds};
/// use plexus_graph::MaturationPhase;
///
/// let t = PhaseThresholds::default(); // 100 / 1000 / 5000
/// assert_eq!(determine_phase(50, &t), MaturationPhase::Genesis);
/// assert_eq!(determine_phase(150, &t), MaturationPhase::Differentiation);
/// assert_eq!(determine_phase(2_000, &t), MaturationPhase::Synaptogenesis);
/// assert_eq!(determine_phase(6_000, &t), MaturationPhase::Pruning);
/// ```
pub const fn determine_phase(total_executions: u64, thresholds: &PhaseThresholds) -> MaturationPhase {
    if total_executions >= thresholds.pruning {
        MaturationPhase::Pruning
    } else if total_executions >= thresholds.synaptogenesis {
        MaturationPhase::Synaptogenesis
    } else if total_executions >= thresholds.differentiation {
        MaturationPhase::Differentiation
    } else {
        MaturationPhase::Genesis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundaries_are_inclusive() {
        let t = PhaseThresholds::default();
        let cases = [
            (0, MaturationPhase::Genesis),
            (99, MaturationPhase::Genesis),
            (100, MaturationPhase::Differentiation),
            (999, MaturationPhase::Differentiation),
            (1_000, MaturationPhase::Synaptogenesis),
            (4_999, MaturationPhase::Synaptogenesis),
            (5_000, MaturationPhase::Pruning),
            (u64::MAX, MaturationPhase::Pruning),
        ];

        for (count, expected) in cases {
            assert_eq!(
                determine_phase(count, &t),
                expected,
                "determine_phase({}) should be {}",
                count,
                expected
            );
        }
    }

    #[test]
    fn custom_thresholds() {
        let t = PhaseThresholds::new(10, 20, 30).unwrap();
        assert_eq!(determine_phase(15, &t), MaturationPhase::Differentiation);
        assert_eq!(determine_phase(150, &t), MaturationPhase::Pruning);
    }

    proptest! {
        #[test]
        fn phase_is_monotonic(a in 0u64..20_000, b in 0u64..20_000) {
            let t = PhaseThresholds::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(determine_phase(lo, &t) <= determine_phase(hi, &t));
        }

        #[test]
        fn phase_depends_only_on_thresholds(
            d in 1u64..1_000,
            gap1 in 1u64..1_000,
            gap2 in 1u64..1_000,
            count in 0u64..5_000,
        ) {
            let t = PhaseThresholds::new(d, d + gap1, d + gap1 + gap2).unwrap();
            let expected = if count >= t.pruning {
                MaturationPhase::Pruning
            } else if count >= t.synaptogenesis {
                MaturationPhase::Synaptogenesis
            } else if count >= t.differentiation {
                MaturationPhase::Differentiation
            } else {
                MaturationPhase::Genesis
            };
            prop_assert_eq!(determine_phase(count, &t), expected);
        }
    }
}
