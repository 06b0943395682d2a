//! Reconciler configuration

use std::time::Duration;

/// Delay before re-checking a database that is not ready yet
pub const DEFAULT_DATABASE_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Delay before retrying a pass that failed
pub const DEFAULT_ERROR_REQUEUE: Duration = Duration::from_secs(30);

/// Timing knobs for the control loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Requeue delay while the database tier reports no ready replica
    pub database_poll_interval: Duration,
    /// Requeue delay after a failed pass
    pub error_requeue: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            database_poll_interval: DEFAULT_DATABASE_POLL_INTERVAL,
            error_requeue: DEFAULT_ERROR_REQUEUE,
        }
    }
}
