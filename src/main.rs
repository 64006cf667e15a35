//! OmniGovern Tracker - cross-chain bridge transaction lifecycle tracking
//!
//! This service creates transactions against the external TransactionStore,
//! polls it for status, and exposes lifecycle state to the OmniGovern UI.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

mod api;
mod config;
mod error;
mod metrics;
mod store;
mod tracker;
mod transaction;

use config::Settings;
use metrics::MetricsServer;
use store::{HttpTransactionStore, TransactionStore};
use tracker::{TrackerCallbacks, TransactionTracker};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting OmniGovern Tracker v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!("Tracking against store at {}", settings.store.base_url);

    // Initialize the store client
    let store: Arc<dyn TransactionStore> = Arc::new(HttpTransactionStore::new(&settings.store)?);

    // Initialize the tracker with logging callbacks as the notifier surface
    let tracker = Arc::new(TransactionTracker::new(
        store.clone(),
        logging_callbacks(),
        Duration::from_millis(settings.tracker.poll_interval_ms),
    ));

    // Initialize metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    // Start API server
    let api_handle = tokio::spawn({
        let api_config = settings.api.clone();
        let state = api::AppState {
            tracker: tracker.clone(),
            store: store.clone(),
        };
        async move {
            if let Err(e) = api::run_server(api_config, state).await {
                error!("API server error: {}", e);
            }
        }
    });

    info!("OmniGovern Tracker is running");
    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    // Graceful shutdown: cancel any in-flight polling loop
    tracker.reset().await;

    // Abort background tasks
    api_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("OmniGovern Tracker stopped");
    Ok(())
}

/// Callbacks that log and record lifecycle events for this deployment.
fn logging_callbacks() -> TrackerCallbacks {
    TrackerCallbacks {
        on_submit_start: Some(Box::new(|| {
            info!("transaction submitted, tracking started");
        })),
        on_source_confirmed: Some(Box::new(|hash| {
            info!(source_tx_hash = %hash, "source chain confirmation");
        })),
        on_destination_confirmed: Some(Box::new(|hash| {
            info!(destination_tx_hash = %hash, "destination chain confirmation");
        })),
        on_complete: Some(Box::new(|tx| {
            info!(tx_id = %tx.id, "bridge transaction completed");
        })),
        on_error: Some(Box::new(|err| {
            warn!(message = %err.message, "tracker error");
        })),
        on_store_mutated: None,
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,omnigovern_tracker=debug,hyper=warn,reqwest=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
