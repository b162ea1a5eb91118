//! Exchange Ledger Binary
//!
//! Opens the ledger, keeps the daily position rolled up in the background,
//! and shuts down cleanly on SIGINT or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin exchange-ledger
//! ```
//!
//! # Environment Variables
//!
//! - `LEDGER_STORE`: file | memory (default: file)
//! - `LEDGER_DATA_DIR`: Directory for table files (default: ./data)
//! - `LEDGER_SHARE_MARKER_PATH`: Last shared month file (default: <data dir>/last_shared_month.txt)
//! - `LEDGER_ROLLUP_INTERVAL_SECS`: Position rollup interval, 0 disables (default: 600)
//! - `LEDGER_STEP_RETRY_ATTEMPTS`: Retries for post-commit steps (default: 3)
//! - `LEDGER_STEP_RETRY_BACKOFF_MS`: Initial retry backoff (default: 50)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: exchange-ledger)
//! - `RUST_LOG`: Log level (default: info)

use std::time::Duration;

use exchange_ledger::application::ports::TableStore;
use exchange_ledger::{Container, LedgerConfig, StoreMode, init_metrics, init_telemetry};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = init_telemetry();

    tracing::info!("Starting Exchange Ledger");

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder not installed");
    }

    let config = LedgerConfig::from_env()?;
    log_config(&config);

    match config.store {
        StoreMode::File => run(Container::file_backed(&config), &config).await,
        StoreMode::Memory => run(Container::in_memory(&config), &config).await,
    }
}

async fn run<S: TableStore + 'static>(
    container: Container<S>,
    config: &LedgerConfig,
) -> anyhow::Result<()> {
    let accounts = container.accounts();
    let (house_usdt, house_toman) = accounts.house_balances().await;
    tracing::info!(
        clients = accounts.count().await,
        house_usdt = %house_usdt,
        house_toman = %house_toman,
        "Ledger opened"
    );

    let shutdown_token = CancellationToken::new();
    let rollup = config.rollup_interval.map(|interval| {
        container
            .position_rollup(interval, shutdown_token.clone())
            .start()
    });
    if rollup.is_none() {
        tracing::info!("Background position rollup disabled");
    }

    await_shutdown(shutdown_token).await;

    if let Some(handle) = rollup
        && tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err()
    {
        tracing::warn!("Position rollup did not stop within the shutdown timeout");
    }

    // Final rollup so the day's position reflects everything recorded.
    let gate = container.gate();
    let session = gate.begin().await;
    match container.aggregator().summary(&session).await {
        Ok(summary) => tracing::info!(net_position = %summary.net_position, "Final position rollup"),
        Err(e) => tracing::error!(error = %e, "Final position rollup failed"),
    }
    drop(session);

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &LedgerConfig) {
    tracing::info!(
        store = config.store.as_str(),
        data_dir = %config.data_dir.display(),
        rollup_interval_secs = config.rollup_interval.map_or(0, |d| d.as_secs()),
        step_retries = config.retry.max_retries,
        "Configuration loaded"
    );
    tracing::debug!(
        share_marker = %config.share_marker_path.display(),
        "Share marker"
    );
}

/// Load .env file from any ancestor directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
