use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crypto_newsfeed::config::Config;
use crypto_newsfeed::fetcher::Fetcher;
use crypto_newsfeed::routes::{self, AppState};
use crypto_newsfeed::scheduler::{RefreshScheduler, SchedulerSettings};
use crypto_newsfeed::view::ViewState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crypto_newsfeed=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("FEEDS_CONFIG").unwrap_or_else(|_| "feeds.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)?
    } else {
        warn!("{} not found, using built-in feed registry", config_path);
        Config::builtin()
    };
    info!("Loaded {} feeds from configuration", config.feeds.len());

    let fetcher = Fetcher::from_config(&config)?;
    let view = Arc::new(ViewState::new());
    let scheduler = Arc::new(RefreshScheduler::new(
        fetcher,
        config.feeds.clone(),
        view.clone(),
        SchedulerSettings::from_config(&config),
    ));

    // Start background refresh task
    let refresh = scheduler.clone().spawn();

    let state = Arc::new(AppState {
        scheduler: scheduler.clone(),
        view,
    });

    // Build router
    let app = Router::new()
        .route("/", get(routes::index))
        .route("/refresh", post(routes::refresh))
        .route("/refresh/status", get(routes::refresh_status))
        .route("/health", get(routes::health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Server starting on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh.shutdown().await;
    info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
