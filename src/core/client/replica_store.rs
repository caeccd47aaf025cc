use async_trait::async_trait;
use kube::Client;
use tracing::{debug, info};

use crate::core::client::conflict_retry::{retry_on_conflict, ConflictRetryPolicy};
use crate::core::client::deployments::{
    desired_replicas, fetch_deployment_by_name_and_namespace, replace_deployment,
    set_desired_replicas,
};
use crate::core::client::error_classifier::{classify, LookupTarget, ReplicaStoreError};
use crate::core::client::kube_resources::Deployment;
use crate::core::client::namespaces::fetch_namespace_by_name;
use crate::domain::deployment::model::{DeploymentRef, ReplicaCount};

/// Read and write access to the desired replica count of Deployments.
///
/// Implementations never panic outward: every failure is returned as a
/// classified [`ReplicaStoreError`]. The namespace is always resolved before
/// the deployment so a missing namespace is never reported as a missing
/// deployment.
#[async_trait]
pub trait ReplicaStore: Send + Sync {
    /// Current desired replica count of `target`.
    async fn fetch_replicas(&self, target: &DeploymentRef) -> Result<ReplicaCount, ReplicaStoreError>;

    /// Set the desired replica count of `target` and return the count the
    /// cluster accepted. Does not wait for the rollout.
    async fn apply_replicas(
        &self,
        target: &DeploymentRef,
        replicas: ReplicaCount,
    ) -> Result<ReplicaCount, ReplicaStoreError>;
}

/// [`ReplicaStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeReplicaStore {
    client: Client,
    retry: ConflictRetryPolicy,
}

impl KubeReplicaStore {
    pub fn new(client: Client, retry: ConflictRetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn ensure_namespace(&self, namespace: &str) -> Result<(), ReplicaStoreError> {
        match fetch_namespace_by_name(&self.client, namespace).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(ReplicaStoreError::NamespaceNotFound {
                namespace: namespace.to_string(),
            }),
            Err(e) => Err(classify(&e, LookupTarget::Namespace(namespace))),
        }
    }

    async fn load_deployment(&self, target: &DeploymentRef) -> Result<Deployment, ReplicaStoreError> {
        match fetch_deployment_by_name_and_namespace(&self.client, target.namespace(), target.name())
            .await
        {
            Ok(Some(deployment)) => Ok(deployment),
            Ok(None) => Err(ReplicaStoreError::DeploymentNotFound {
                target: target.clone(),
            }),
            Err(e) => Err(classify(&e, LookupTarget::Deployment(target))),
        }
    }

    /// One read-modify-write cycle against the latest resourceVersion.
    async fn apply_once(
        &self,
        target: &DeploymentRef,
        desired: i32,
        attempt: u32,
    ) -> Result<ReplicaCount, ReplicaStoreError> {
        let mut deployment = self.load_deployment(target).await?;

        let current = desired_replicas(&deployment);
        if current == desired {
            debug!("{} already at {} replica(s), skipping write", target, desired);
            return to_replica_count(current);
        }

        set_desired_replicas(&mut deployment, desired);

        let updated = replace_deployment(&self.client, target.namespace(), target.name(), &deployment)
            .await
            .map_err(|e| classify(&e, LookupTarget::Deployment(target)))?;

        info!(
            "Scaled {} from {} to {} replica(s) (attempt {})",
            target, current, desired, attempt
        );
        to_replica_count(desired_replicas(&updated))
    }
}

#[async_trait]
impl ReplicaStore for KubeReplicaStore {
    async fn fetch_replicas(&self, target: &DeploymentRef) -> Result<ReplicaCount, ReplicaStoreError> {
        self.ensure_namespace(target.namespace()).await?;
        let deployment = self.load_deployment(target).await?;
        to_replica_count(desired_replicas(&deployment))
    }

    async fn apply_replicas(
        &self,
        target: &DeploymentRef,
        replicas: ReplicaCount,
    ) -> Result<ReplicaCount, ReplicaStoreError> {
        let desired = i32::try_from(replicas).map_err(|_| {
            ReplicaStoreError::unknown(format!("replica count {} exceeds int32", replicas))
        })?;

        self.ensure_namespace(target.namespace()).await?;

        retry_on_conflict(self.retry, move |attempt| self.apply_once(target, desired, attempt)).await
    }
}

fn to_replica_count(replicas: i32) -> Result<ReplicaCount, ReplicaStoreError> {
    ReplicaCount::try_from(replicas).map_err(|_| {
        ReplicaStoreError::unknown(format!("cluster reported negative replica count {}", replicas))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use http::{Method, Request, Response};
    use http_body_util::BodyExt;
    use kube::client::Body;
    use serde_json::{json, Value};
    use tokio::task::JoinHandle;

    use crate::core::client::error_classifier::ReplicaErrorKind;

    type ApiServerHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

    const NAMESPACE_PATH: &str = "/api/v1/namespaces/integration-test";
    const DEPLOYMENT_PATH: &str = "/apis/apps/v1/namespaces/integration-test/deployments/nginx";

    /// One scripted answer of the fake API server.
    struct Reply {
        method: Method,
        path: &'static str,
        status: u16,
        body: Value,
    }

    impl Reply {
        fn new(method: Method, path: &'static str, status: u16, body: Value) -> Self {
            Self {
                method,
                path,
                status,
                body,
            }
        }
    }

    fn mock_store() -> (KubeReplicaStore, ApiServerHandle) {
        let (service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(service, "default");
        let store = KubeReplicaStore::new(client, ConflictRetryPolicy::new(3, Duration::from_millis(1)));
        (store, handle)
    }

    /// Answer requests in script order, checking method and path. Returns the
    /// JSON bodies the client sent (`Null` for empty bodies). Fails if the
    /// client sends anything beyond the script once the store is dropped.
    fn spawn_api_server(mut handle: ApiServerHandle, script: Vec<Reply>) -> JoinHandle<Vec<Value>> {
        tokio::spawn(async move {
            let mut received = Vec::new();

            for reply in script {
                let (request, send) = handle
                    .next_request()
                    .await
                    .expect("client stopped before the scripted requests were made");

                assert_eq!(request.method(), reply.method);
                assert_eq!(request.uri().path(), reply.path);

                let bytes = request.into_body().collect().await.unwrap().to_bytes();
                received.push(serde_json::from_slice(&bytes).unwrap_or(Value::Null));

                let response = Response::builder()
                    .status(reply.status)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&reply.body).unwrap()))
                    .unwrap();
                send.send_response(response);
            }

            assert!(handle.next_request().await.is_none(), "unscripted request");
            received
        })
    }

    fn namespace(name: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": name }
        })
    }

    fn deployment(replicas: i32, resource_version: &str) -> Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": "nginx",
                "namespace": "integration-test",
                "resourceVersion": resource_version
            },
            "spec": {
                "replicas": replicas,
                "selector": { "matchLabels": { "app": "nginx" } },
                "template": {}
            }
        })
    }

    fn status(code: u16, reason: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Status",
            "metadata": {},
            "status": "Failure",
            "message": format!("{} ({})", reason, code),
            "reason": reason,
            "code": code
        })
    }

    fn nginx() -> DeploymentRef {
        DeploymentRef::new("integration-test", "nginx").unwrap()
    }

    #[test]
    fn test_to_replica_count_rejects_negative() {
        assert_eq!(to_replica_count(0), Ok(0));
        assert_eq!(to_replica_count(12), Ok(12));
        assert!(matches!(
            to_replica_count(-1),
            Err(ReplicaStoreError::Unknown { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_namespace_stops_before_deployment_lookup() {
        let (store, handle) = mock_store();
        let server = spawn_api_server(
            handle,
            vec![Reply::new(
                Method::GET,
                "/api/v1/namespaces/nonexistent-namespace",
                404,
                status(404, "NotFound"),
            )],
        );

        let target = DeploymentRef::new("nonexistent-namespace", "nginx").unwrap();
        let result = store.fetch_replicas(&target).await;
        drop(store);
        server.await.unwrap();

        assert_eq!(
            result,
            Err(ReplicaStoreError::NamespaceNotFound {
                namespace: "nonexistent-namespace".into()
            })
        );
    }

    #[tokio::test]
    async fn test_missing_deployment_in_existing_namespace() {
        let (store, handle) = mock_store();
        let server = spawn_api_server(
            handle,
            vec![
                Reply::new(Method::GET, NAMESPACE_PATH, 200, namespace("integration-test")),
                Reply::new(Method::GET, DEPLOYMENT_PATH, 404, status(404, "NotFound")),
            ],
        );

        let result = store.fetch_replicas(&nginx()).await;
        drop(store);
        server.await.unwrap();

        assert_eq!(result, Err(ReplicaStoreError::DeploymentNotFound { target: nginx() }));
    }

    #[tokio::test]
    async fn test_fetch_reads_spec_replicas() {
        let (store, handle) = mock_store();
        let server = spawn_api_server(
            handle,
            vec![
                Reply::new(Method::GET, NAMESPACE_PATH, 200, namespace("integration-test")),
                Reply::new(Method::GET, DEPLOYMENT_PATH, 200, deployment(3, "11")),
            ],
        );

        let result = store.fetch_replicas(&nginx()).await;
        drop(store);
        server.await.unwrap();

        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn test_namespace_lookup_forbidden_is_unknown() {
        let (store, handle) = mock_store();
        let server = spawn_api_server(
            handle,
            vec![Reply::new(Method::GET, NAMESPACE_PATH, 403, status(403, "Forbidden"))],
        );

        let result = store.fetch_replicas(&nginx()).await;
        drop(store);
        server.await.unwrap();

        assert_eq!(result.unwrap_err().kind(), ReplicaErrorKind::Unknown);
    }

    #[tokio::test]
    async fn test_apply_skips_write_when_already_at_target() {
        let (store, handle) = mock_store();
        let server = spawn_api_server(
            handle,
            vec![
                Reply::new(Method::GET, NAMESPACE_PATH, 200, namespace("integration-test")),
                Reply::new(Method::GET, DEPLOYMENT_PATH, 200, deployment(5, "7")),
            ],
        );

        let result = store.apply_replicas(&nginx(), 5).await;
        drop(store);
        server.await.unwrap();

        assert_eq!(result, Ok(5));
    }

    #[tokio::test]
    async fn test_apply_rereads_after_conflict_and_returns_server_count() {
        let (store, handle) = mock_store();
        let server = spawn_api_server(
            handle,
            vec![
                Reply::new(Method::GET, NAMESPACE_PATH, 200, namespace("integration-test")),
                Reply::new(Method::GET, DEPLOYMENT_PATH, 200, deployment(2, "1")),
                Reply::new(Method::PUT, DEPLOYMENT_PATH, 409, status(409, "Conflict")),
                Reply::new(Method::GET, DEPLOYMENT_PATH, 200, deployment(3, "2")),
                // The server's answer, not the request, decides the returned count.
                Reply::new(Method::PUT, DEPLOYMENT_PATH, 200, deployment(6, "3")),
            ],
        );

        let result = store.apply_replicas(&nginx(), 5).await;
        drop(store);
        let received = server.await.unwrap();

        assert_eq!(result, Ok(6));

        let first_put = &received[2];
        assert_eq!(first_put["spec"]["replicas"], json!(5));
        assert_eq!(first_put["metadata"]["resourceVersion"], json!("1"));

        let second_put = &received[4];
        assert_eq!(second_put["spec"]["replicas"], json!(5));
        assert_eq!(second_put["metadata"]["resourceVersion"], json!("2"));
    }

    #[tokio::test]
    async fn test_apply_surfaces_conflict_after_three_attempts() {
        let (store, handle) = mock_store();

        let mut script = vec![Reply::new(
            Method::GET,
            NAMESPACE_PATH,
            200,
            namespace("integration-test"),
        )];
        for version in ["1", "2", "3"] {
            script.push(Reply::new(Method::GET, DEPLOYMENT_PATH, 200, deployment(2, version)));
            script.push(Reply::new(Method::PUT, DEPLOYMENT_PATH, 409, status(409, "Conflict")));
        }
        let server = spawn_api_server(handle, script);

        let result = store.apply_replicas(&nginx(), 5).await;
        drop(store);
        let received = server.await.unwrap();

        assert_eq!(received.len(), 7);
        assert_eq!(result, Err(ReplicaStoreError::Conflict { target: nginx() }));
    }

    #[tokio::test]
    async fn test_apply_on_missing_namespace_never_writes() {
        let (store, handle) = mock_store();
        let server = spawn_api_server(
            handle,
            vec![Reply::new(Method::GET, NAMESPACE_PATH, 404, status(404, "NotFound"))],
        );

        let result = store.apply_replicas(&nginx(), 1).await;
        drop(store);
        server.await.unwrap();

        assert_eq!(result.unwrap_err().kind(), ReplicaErrorKind::NamespaceNotFound);
    }
}
