//! Planner configuration.

use chrono::Duration;

/// Configuration parameters for journey planning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum number of transfers allowed when a query does not say.
    pub max_transfers: usize,

    /// Maximum number of routes to return when a query does not say.
    pub max_results: usize,

    /// Minimum time to change trains at a station (seconds).
    pub min_transfer_secs: i64,

    /// Deadline for a whole planning run (seconds).
    pub timeout_secs: u64,

    /// How long a request waits for a free planner slot (milliseconds).
    /// Requests that cannot get one are rejected as busy.
    pub busy_wait_ms: u64,

    /// Maximum number of planning runs active at once.
    pub max_concurrent_runs: usize,
}

impl PlannerConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_transfers: usize,
        max_results: usize,
        min_transfer_secs: i64,
        timeout_secs: u64,
        busy_wait_ms: u64,
        max_concurrent_runs: usize,
    ) -> Self {
        Self {
            max_transfers,
            max_results,
            min_transfer_secs,
            timeout_secs,
            busy_wait_ms,
            max_concurrent_runs,
        }
    }

    /// Returns the minimum transfer time as a Duration.
    pub fn min_transfer(&self) -> Duration {
        Duration::seconds(self.min_transfer_secs)
    }

    /// Returns the run deadline as a std Duration, for tokio timers.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    /// Returns the busy wait as a std Duration, for tokio timers.
    pub fn busy_wait(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.busy_wait_ms)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_transfers: 4,
            max_results: 5,
            min_transfer_secs: 300, // 5 minutes
            timeout_secs: 30,
            busy_wait_ms: 500,
            max_concurrent_runs: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.max_transfers, 4);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.min_transfer_secs, 300);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.busy_wait_ms, 500);
        assert_eq!(config.max_concurrent_runs, 4);
    }

    #[test]
    fn duration_methods() {
        let config = PlannerConfig::default();

        assert_eq!(config.min_transfer(), Duration::minutes(5));
        assert_eq!(config.timeout(), std::time::Duration::from_secs(30));
        assert_eq!(config.busy_wait(), std::time::Duration::from_millis(500));
    }

    #[test]
    fn custom_config() {
        let config = PlannerConfig::new(2, 3, 120, 10, 100, 1);

        assert_eq!(config.max_transfers, 2);
        assert_eq!(config.max_results, 3);
        assert_eq!(config.min_transfer(), Duration::minutes(2));
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.busy_wait_ms, 100);
        assert_eq!(config.max_concurrent_runs, 1);
    }
}
