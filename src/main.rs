//! JobHub Server: job submission, scheduling and completion webhooks.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt};

use jobhub_api::{AppState, build_app};
use jobhub_auth::WebhookAuthenticator;
use jobhub_core::config::AppConfig;
use jobhub_core::error::AppError;
use jobhub_core::traits::{Clock, JobBroker, SystemClock};
use jobhub_database::Stores;
use jobhub_worker::{CompletionReporter, JobExecutor, WebhookReporter, WorkerRunner};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let dir = std::env::var("JOBHUB_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("JOBHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load_from(&dir, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting JobHub");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    // ── Step 1: Broker and stores ────────────────────────────────
    let broker = jobhub_broker::connect(&config.broker, Arc::clone(&clock))?;
    let stores = Stores::connect(&config.database, Arc::clone(&clock)).await?;

    // ── Step 2: Webhook authenticator ────────────────────────────
    let authenticator = WebhookAuthenticator::from_config(&config.webhook, Arc::clone(&clock))?;

    // ── Step 3: Shutdown channel & worker ────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if config.worker.enabled {
        Some(spawn_worker(
            &config,
            Arc::clone(&broker),
            Arc::clone(&clock),
            shutdown_rx,
            grace,
        )?)
    } else {
        None
    };

    // ── Step 4: Build and start HTTP server ──────────────────────
    let state = AppState::new(config.clone(), broker, stores.clone(), authenticator);
    let app = build_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "JobHub server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 5: Drain ────────────────────────────────────────────
    if let Some(handle) = worker_handle {
        if tokio::time::timeout(grace + Duration::from_secs(1), handle)
            .await
            .is_err()
        {
            tracing::warn!("Worker did not stop within the shutdown grace period");
        }
    }
    if let Some(pool) = &stores.pool {
        pool.close().await;
    }

    tracing::info!("JobHub server stopped");
    Ok(())
}

/// Start the embedded worker pool
fn spawn_worker(
    config: &AppConfig,
    broker: Arc<dyn JobBroker>,
    clock: Arc<dyn Clock>,
    cancel: watch::Receiver<bool>,
    grace: Duration,
) -> Result<JoinHandle<()>, AppError> {
    let executor = JobExecutor::from_config(&config.worker)?;
    if executor.registered_classes().is_empty() {
        tracing::warn!("Worker enabled without executors; every claimed job will fail");
    }

    let reporter: Option<Arc<dyn CompletionReporter>> = match config.webhook.secret() {
        Some(secret) => Some(Arc::new(WebhookReporter::new(
            config.worker.callback_url.clone(),
            secret,
            Duration::from_secs(config.worker.http_timeout_seconds),
            clock,
        )?)),
        None => {
            tracing::warn!("No webhook secret configured; worker will not report completions");
            None
        }
    };

    let runner = WorkerRunner::new(broker, Arc::new(executor), reporter, &config.worker);
    Ok(tokio::spawn(async move {
        runner.run(cancel, grace).await;
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
