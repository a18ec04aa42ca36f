//! Vote thresholds.
//!
//! Every affected station votes, then approvals must strictly outnumber
//! rejections. For `n` voters that is `floor(n / 2) + 1` approvals.

/// Whether a fully-voted proposal passes. Ties fail.
pub const fn majority_approves(approve: usize, reject: usize) -> bool {
    approve > reject
}

/// Approvals required to pass when all `voters` vote.
///
/// # Examples
///
/// ```
/// use plexus_consensus::approvals_needed;
///
/// assert_eq!(approvals_needed(1), 1);
/// assert_eq!(approvals_needed(2), 2); // 1-1 is a tie
/// assert_eq!(approvals_needed(5), 3);
/// ```
pub const fn approvals_needed(voters: usize) -> usize {
    voters / 2 + 1
}
