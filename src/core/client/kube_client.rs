use std::time::Duration;

use anyhow::{Context, Result};
use kube::{Client, Config};
use tracing::debug;

/// Creates a Kubernetes client from the in-cluster service account or the
/// local kubeconfig, with bounded connect and read timeouts.
pub async fn build_kube_client(connect_timeout: Duration, read_timeout: Duration) -> Result<Client> {
    let mut config = Config::infer()
        .await
        .context("failed to infer Kubernetes client configuration")?;

    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);

    debug!(
        "Using Kubernetes API server {} (connect_timeout={:?}, read_timeout={:?})",
        config.cluster_url, connect_timeout, read_timeout
    );

    let client = Client::try_from(config).context("failed to build Kubernetes client")?;

    debug!("Kubernetes client initialized successfully");
    Ok(client)
}
