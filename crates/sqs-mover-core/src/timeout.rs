//! Visibility timeout policy for the drain.

use std::time::Duration;

/// Shortest visibility timeout handed to a receive call, in seconds.
pub const MIN_VISIBILITY_TIMEOUT_SECS: u64 = 60;

/// Picks how long received messages stay hidden from other consumers.
///
/// The timeout grows with the backlog (one second per hundred messages) so that
/// messages received early in a long drain do not reappear on the source queue,
/// and get received a second time, before the drain has finished. Small queues
/// get a one minute floor to cover per-call latency.
///
/// ```
/// use std::time::Duration;
/// use sqs_mover::compute_visibility_timeout;
///
/// assert_eq!(compute_visibility_timeout(0), Duration::from_secs(60));
/// assert_eq!(compute_visibility_timeout(12_000), Duration::from_secs(120));
/// ```
pub fn compute_visibility_timeout(estimated_count: u64) -> Duration {
    Duration::from_secs((estimated_count / 100).max(MIN_VISIBILITY_TIMEOUT_SECS))
}
