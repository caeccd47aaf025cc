use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use qbert::app_state::build_app_state;
use qbert::config::AppConfig;
use qbert::core::client::kube_client::build_kube_client;
use qbert::core::client::replica_store::KubeReplicaStore;
use qbert::logging::init_tracing;
use qbert::routes::app_router;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;
    let _log_guard = init_tracing(config.log_dir.as_deref())?;

    // Initialize Kubernetes client
    let client = build_kube_client(config.kube_connect_timeout, config.request_timeout).await?;
    let store = Arc::new(KubeReplicaStore::new(client, config.conflict_retry));

    let state = build_app_state(store, config.request_timeout);
    let app = app_router().with_state(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Starting server on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received, draining connections");
}
