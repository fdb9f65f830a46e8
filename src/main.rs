use anyhow::{bail, Context};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use medtap_api::config::{AppConfig, Environment};
use medtap_api::database::{connect, ensure_schema};
use medtap_api::state::default_audit_sink;
use medtap_api::{router, AppState, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting MedTap API in {:?} mode", config.environment);

    let stores = match config.database.url.as_deref() {
        Some(_) => {
            let pool = connect(&config.database).await.context("connecting to database")?;
            if config.database.sync_schema {
                ensure_schema(&pool).await.context("creating schema")?;
            }
            Stores::postgres(pool)
        }
        None if config.environment == Environment::Development => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            Stores::in_memory()
        }
        None => bail!("DATABASE_URL must be set outside development"),
    };

    let audit = default_audit_sink(&config);
    let bind_addr = config.bind_addr();
    let state = AppState::new(config, stores, audit).context("building application state")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("MedTap API listening on http://{}", bind_addr);

    axum::serve(listener, router(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
