use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lc_planner::alerts::AlertBoard;
use lc_planner::fragments::{
    CacheConfig, ConfiguredSource, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DirectorySource,
    RetryConfig, SourceConfig,
};
use lc_planner::planner::{PlannerConfig, StationTransferTimes};
use lc_planner::web::{AppState, create_router};

/// How often to re-read the alerts file.
const ALERTS_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    });

    let registered = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .try_init();
    if let Err(err) = registered {
        eprintln!("failed to set global tracing subscriber - {err}");
    }
}

/// Live server unless `LC_DATA_DIR` points at a directory of pages.
fn connection_source() -> Result<ConfiguredSource, Box<dyn std::error::Error>> {
    if let Some(dir) = std::env::var_os("LC_DATA_DIR") {
        let source = DirectorySource::new(&dir, DEFAULT_PAGE_SIZE)?;
        info!(dir = %PathBuf::from(&dir).display(), pages = source.len(), "serving connections from disk");
        return Ok(ConfiguredSource::Directory(source));
    }

    let base_url = std::env::var("LC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    info!(%base_url, "serving connections from server");
    Ok(ConfiguredSource::http(
        SourceConfig::new(base_url),
        RetryConfig::default(),
        &CacheConfig::default(),
    )?)
}

/// Alerts from `LC_ALERTS_FILE`, re-read in the background.
fn alert_board() -> Result<AlertBoard, Box<dyn std::error::Error>> {
    let Some(path) = std::env::var_os("LC_ALERTS_FILE").map(PathBuf::from) else {
        return Ok(AlertBoard::new());
    };

    let board = AlertBoard::load(&path)?;

    let refresh = board.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ALERTS_REFRESH_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match refresh.reload(&path).await {
                Ok(count) => info!(count, "refreshed alerts"),
                Err(e) => warn!(error = %e, "failed to refresh alerts"),
            }
        }
    });

    Ok(board)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = PlannerConfig::default();
    let source = connection_source()?;
    let alerts = alert_board()?;
    let policy = StationTransferTimes::new(config.min_transfer());

    let state = AppState::new(source, policy, alerts, config);
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("LC_BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "journey planner listening");
    info!("  GET  /health       - Health check");
    info!("  POST /journey/plan - Plan a journey");
    info!("  GET  /liveboard    - Station departures or arrivals");

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "journey planner stopped");
            ExitCode::FAILURE
        }
    }
}
