use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use innkeep_api::{app, AppState, AuthConfig};
use innkeep_store::app_config::{Config, StoreBackend};
use innkeep_store::{DbClient, Repositories};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "innkeep_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Innkeep API on port {}", config.server.port);

    let (repos, db) = match config.database.backend {
        StoreBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            (Repositories::postgres(db.pool.clone()), Some(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            (Repositories::in_memory(), None)
        }
    };

    let app_state = AppState::new(repos, AuthConfig::from(&config.auth));
    let app = app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(db) = db {
        db.close().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves when `signal` fires. A listener that failed to install never
/// resolves, so it cannot trigger a shutdown by itself.
async fn on_signal<F>(signal: F, name: &str)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for {}", name);
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = on_signal(tokio::signal::ctrl_c(), "Ctrl+C");

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_listener_never_fires() {
        let failed = async { Err::<(), _>(std::io::Error::other("no signal driver")) };
        let waited = tokio::time::timeout(Duration::from_millis(50), on_signal(failed, "test")).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_delivered_signal_fires() {
        let delivered = async { Ok::<(), std::io::Error>(()) };
        let waited = tokio::time::timeout(Duration::from_millis(50), on_signal(delivered, "test")).await;
        assert!(waited.is_ok());
    }
}
