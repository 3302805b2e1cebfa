//! Sleepy Server
//!
//! Main entry point for the status server.

use anyhow::Context;
use sleepy_server::{
    push_notifier::PushNotifier,
    state::{AppConfig, AppState},
    state_store::StateStore,
    status_catalog::StatusCatalog,
    web_api,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize tracing
    let default_filter = if config.debug {
        "sleepy_server=debug,tower_http=debug"
    } else {
        "sleepy_server=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sleepy Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        host = %config.host,
        port = config.port,
        timezone = %config.timezone.name(),
        data_path = %config.data_path.display(),
        metrics = config.metrics_enabled,
        auto_switch_status = config.auto_switch_status,
        "Configuration loaded"
    );

    let status_catalog = StatusCatalog::load(config.status_list_path.as_deref())
        .context("Failed to load status list")?;
    tracing::info!(count = status_catalog.records().len(), "Status catalog ready");

    let store = Arc::new(
        StateStore::load(config.data_path.clone(), config.store_options())
            .await
            .context("Failed to load state store")?,
    );
    let checkpoint = store.start_checkpoint(Duration::from_secs(config.checkdata_interval));

    let notifier = PushNotifier::new(config.sendkey.clone());
    let state = AppState::new(config, store.clone(), status_catalog, notifier);

    let app = web_api::create_router(state.clone())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    let shutdown = state.shutdown.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
        shutdown.cancel();
    })
    .await?;

    checkpoint.abort();
    store.save().await.context("Failed to save state on exit")?;
    tracing::info!("State saved, bye");

    Ok(())
}
