use crate::core::client::kube_resources::Namespace;
use kube::{Api, Client};
use tracing::debug;

/// Look up a namespace by name. `Ok(None)` when it does not exist.
pub async fn fetch_namespace_by_name(
    client: &Client,
    name: &str,
) -> Result<Option<Namespace>, kube::Error> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let namespace = namespaces.get_opt(name).await?;

    debug!("Looked up namespace '{}': found={}", name, namespace.is_some());
    Ok(namespace)
}
