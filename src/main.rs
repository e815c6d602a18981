use botkeeper::{
    config::AppConfig,
    ratelimit::RateLimiter,
    registry::InstanceRegistry,
    store::SnapshotStore,
    vault::{CredentialVault, DEVELOPMENT_SECRET},
    web,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up a local .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "botkeeper=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Botkeeper v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::init()?;
    info!(
        "Configuration loaded ({})",
        if config.is_production() { "production" } else { "development" }
    );

    let secret = match config.vault.secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => secret,
        None => {
            warn!("vault.secret is not set, using the built-in development key");
            warn!("Set BOTKEEPER_VAULT__SECRET before storing real tokens");
            DEVELOPMENT_SECRET
        }
    };
    let vault = Arc::new(CredentialVault::new(secret));

    let store = SnapshotStore::new(&config.store.path);
    info!("Bot instance table: {}", store.path().display());
    let registry = Arc::new(InstanceRegistry::from_config(store, vault, &config.registry));

    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    let sweep_handle = limiter
        .clone()
        .spawn_eviction_sweep(config.rate_limit.sweep_interval());
    info!(
        "Rate limit: {} requests per {}s per client",
        config.rate_limit.max_requests, config.rate_limit.window_secs
    );

    let state = web::AppState {
        registry,
        limiter,
        production: config.is_production(),
    };
    let app = web::create_router(state);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Management API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep_handle.abort();
    info!("Botkeeper shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
