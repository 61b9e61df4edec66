//! OrgPress API server

use anyhow::Context;
use orgpress_api::{
    config::LogFormat,
    directory::{CachedDirectory, DirectoryClient, OrgCache},
    store::PgPostStore,
    AppState, Config,
};
use std::{sync::Arc, time::Duration};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How often expired organization cache entries are purged
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    tracing::info!(
        root_domain = %config.root_domain,
        bind_address = %config.bind_address,
        "Starting OrgPress API"
    );

    // Database
    let pool = orgpress_shared::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    orgpress_shared::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    let posts = Arc::new(PgPostStore::new(pool));

    // Identity directory
    let client = DirectoryClient::new(
        &config.identity_api_url,
        config.identity_secret_key.clone(),
        config.identity_request_timeout,
    )
    .context("Failed to build directory client")?;
    let cache = Arc::new(OrgCache::with_ttl(config.directory_cache_ttl));
    let directory = Arc::new(CachedDirectory::new(Arc::new(client), cache.clone()));

    let cleanup = tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            cache.cleanup();
            let stats = cache.stats();
            tracing::trace!(active = stats.active_entries, "Organization cache cleaned up");
        }
    });

    let state = AppState::from_config(&config, directory, posts);
    let app = orgpress_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    tracing::info!(address = %config.bind_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cleanup.abort();
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("orgpress_api=info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
