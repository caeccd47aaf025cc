use crate::core::client::kube_resources::Deployment;
use kube::api::PostParams;
use kube::{Api, Client};
use tracing::debug;

/// Fetch a single deployment by name and namespace. `Ok(None)` when the
/// deployment does not exist.
pub async fn fetch_deployment_by_name_and_namespace(
    client: &Client,
    namespace: &str,
    deployment_name: &str,
) -> Result<Option<Deployment>, kube::Error> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployment = deployments.get_opt(deployment_name).await?;

    debug!(
        "Fetched deployment {}/{}: found={}",
        namespace,
        deployment_name,
        deployment.is_some()
    );
    Ok(deployment)
}

/// Replace a deployment. The object's `metadata.resourceVersion` is sent
/// along, so the API server answers 409 if it changed since it was read.
pub async fn replace_deployment(
    client: &Client,
    namespace: &str,
    deployment_name: &str,
    deployment: &Deployment,
) -> Result<Deployment, kube::Error> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let updated = deployments
        .replace(deployment_name, &PostParams::default(), deployment)
        .await?;

    debug!(
        "Replaced deployment {}/{} (resourceVersion={:?})",
        namespace, deployment_name, updated.metadata.resource_version
    );
    Ok(updated)
}

/// Desired replica count from a deployment spec. The API server defaults an
/// omitted `spec.replicas` to 1.
pub fn desired_replicas(deployment: &Deployment) -> i32 {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1)
}

/// Set the desired replica count, creating the spec if it is absent.
pub fn set_desired_replicas(deployment: &mut Deployment, replicas: i32) {
    deployment.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
}
