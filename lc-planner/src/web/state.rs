//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::alerts::AlertBoard;
use crate::fragments::ConfiguredSource;
use crate::liveboard::LiveboardConfig;
use crate::planner::{PlannerConfig, StationTransferTimes};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Where connections come from
    pub source: Arc<ConfiguredSource>,

    /// Minimum change times per station
    pub policy: Arc<StationTransferTimes>,

    /// Published service alerts
    pub alerts: Arc<AlertBoard>,

    /// Journey planner configuration
    pub config: Arc<PlannerConfig>,

    /// Liveboard configuration
    pub liveboard: Arc<LiveboardConfig>,

    /// Slots for concurrently active planning runs
    pub runs: Arc<Semaphore>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        source: ConfiguredSource,
        policy: StationTransferTimes,
        alerts: AlertBoard,
        config: PlannerConfig,
    ) -> Self {
        let runs = Semaphore::new(config.max_concurrent_runs.max(1));
        Self {
            source: Arc::new(source),
            policy: Arc::new(policy),
            alerts: Arc::new(alerts),
            config: Arc::new(config),
            liveboard: Arc::new(LiveboardConfig::default()),
            runs: Arc::new(runs),
        }
    }

    /// Replace the default liveboard configuration.
    pub fn with_liveboard_config(mut self, config: LiveboardConfig) -> Self {
        self.liveboard = Arc::new(config);
        self
    }
}
