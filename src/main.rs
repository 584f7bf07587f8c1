mod adapters;
mod application;
mod config;
mod domain;
mod interface;
mod ports;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{DirectoryRegistry, MemoryStore, ProcessRunner};
use application::{ActionService, RefreshService, Scheduler};
use config::Config;
use interface::http::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let (config, config_warnings) = Config::load();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("probemon={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting probemon v{}", env!("CARGO_PKG_VERSION"));
    for warning in &config_warnings {
        warn!("{}", warning);
    }
    info!("Configuration: {:?}", config);
    if config.secret.is_none() {
        warn!("PROBEMON_SECRET is not set, API authentication is disabled");
    }

    // Shutdown signal shared with every in-flight child process
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Wire adapters into the engine services
    let registry = Arc::new(DirectoryRegistry::new(
        config.plugin_dirs.clone(),
        config.disabled.clone(),
    ));
    let runner = Arc::new(ProcessRunner::new(
        Duration::from_secs(config.plugin_timeout),
        Duration::from_secs(config.action_timeout),
        Duration::from_secs(config.kill_grace),
        config.pool_width,
        shutdown_rx.clone(),
    ));
    let store = Arc::new(MemoryStore::new());

    let refresh = Arc::new(RefreshService::new(
        registry,
        runner.clone(),
        store.clone(),
        config.plugin_timeout,
        shutdown_rx.clone(),
    ));
    let actions = Arc::new(ActionService::new(runner, store.clone(), refresh.clone()));

    // First tick fires immediately, populating the dashboard at startup
    let scheduler = Scheduler::new(
        refresh.clone(),
        Duration::from_secs(config.refresh_interval),
        shutdown_rx,
    );
    let scheduler_task = tokio::spawn(scheduler.run());
    info!("✓ Refresh scheduler started ({}s interval)", config.refresh_interval);

    // Create HTTP server
    let state = AppState {
        store,
        actions,
        refresh,
        secret: config.secret.clone(),
    };
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ probemon listening on {}", addr);
    info!("  → Dashboard: http://localhost:{}/api/dashboard", config.port);

    // The shutdown broadcast must fire before connection draining: an
    // in-flight action handler only returns once its child exits, and the
    // child is terminated by this same signal.
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = scheduler_task.await;
    info!("probemon stopped");

    Ok(())
}
