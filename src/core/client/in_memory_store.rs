//! In-process stand-in for the cluster, used by tests.
//!
//! Each deployment carries a resource version that is bumped on every write,
//! and writes are compare-and-swap against the version that was read, so the
//! store reproduces the API server's optimistic-concurrency behaviour.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::client::conflict_retry::{retry_on_conflict, ConflictRetryPolicy};
use crate::core::client::error_classifier::{classify_status, LookupTarget, ReplicaStoreError};
use crate::core::client::replica_store::ReplicaStore;
use crate::domain::deployment::model::{DeploymentRef, ReplicaCount};

#[derive(Debug, Clone, Copy)]
struct StoredDeployment {
    replicas: ReplicaCount,
    resource_version: u64,
}

#[derive(Debug, Default)]
struct ClusterState {
    namespaces: HashMap<String, HashMap<String, StoredDeployment>>,
    forced_conflicts: u32,
    unavailable: bool,
    write_attempts: u64,
}

pub struct InMemoryReplicaStore {
    state: RwLock<ClusterState>,
    retry: ConflictRetryPolicy,
}

impl Default for InMemoryReplicaStore {
    fn default() -> Self {
        Self::new(ConflictRetryPolicy::default())
    }
}

impl InMemoryReplicaStore {
    pub fn new(retry: ConflictRetryPolicy) -> Self {
        Self {
            state: RwLock::new(ClusterState::default()),
            retry,
        }
    }

    /// Add an empty namespace.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.state
            .get_mut()
            .namespaces
            .entry(namespace.to_string())
            .or_default();
        self
    }

    /// Add a deployment, creating its namespace if needed.
    pub fn with_deployment(mut self, namespace: &str, name: &str, replicas: ReplicaCount) -> Self {
        self.state
            .get_mut()
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(
                name.to_string(),
                StoredDeployment {
                    replicas,
                    resource_version: 1,
                },
            );
        self
    }

    /// Make the next `count` writes lose their race against a simulated
    /// concurrent writer.
    pub async fn inject_conflicts(&self, count: u32) {
        self.state.write().await.forced_conflicts = count;
    }

    /// Make every call fail as if the API server were unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Number of write attempts that reached the store.
    pub async fn write_attempts(&self) -> u64 {
        self.state.read().await.write_attempts
    }

    /// Stored replica count, bypassing the failure injection.
    pub async fn replicas_of(&self, namespace: &str, name: &str) -> Option<ReplicaCount> {
        self.state
            .read()
            .await
            .namespaces
            .get(namespace)
            .and_then(|deployments| deployments.get(name))
            .map(|d| d.replicas)
    }

    async fn read(&self, target: &DeploymentRef) -> Result<StoredDeployment, ReplicaStoreError> {
        let state = self.state.read().await;

        if state.unavailable {
            return Err(classify_status(
                None,
                LookupTarget::Deployment(target),
                "connection refused",
            ));
        }

        let deployments = state.namespaces.get(target.namespace()).ok_or_else(|| {
            classify_status(
                Some(404),
                LookupTarget::Namespace(target.namespace()),
                "namespace not found",
            )
        })?;

        deployments.get(target.name()).copied().ok_or_else(|| {
            classify_status(
                Some(404),
                LookupTarget::Deployment(target),
                "deployment not found",
            )
        })
    }

    async fn compare_and_swap(
        &self,
        target: &DeploymentRef,
        expected_version: u64,
        replicas: ReplicaCount,
    ) -> Result<ReplicaCount, ReplicaStoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.write_attempts += 1;

        if state.unavailable {
            return Err(classify_status(
                None,
                LookupTarget::Deployment(target),
                "connection refused",
            ));
        }

        let stored = state
            .namespaces
            .get_mut(target.namespace())
            .and_then(|deployments| deployments.get_mut(target.name()))
            .ok_or_else(|| {
                classify_status(
                    Some(404),
                    LookupTarget::Deployment(target),
                    "deployment not found",
                )
            })?;

        if state.forced_conflicts > 0 {
            state.forced_conflicts -= 1;
            stored.resource_version += 1;
        }

        if stored.resource_version != expected_version {
            return Err(classify_status(
                Some(409),
                LookupTarget::Deployment(target),
                "the object has been modified",
            ));
        }

        stored.replicas = replicas;
        stored.resource_version += 1;
        Ok(stored.replicas)
    }

    async fn apply_once(
        &self,
        target: &DeploymentRef,
        replicas: ReplicaCount,
    ) -> Result<ReplicaCount, ReplicaStoreError> {
        let observed = self.read(target).await?;
        if observed.replicas == replicas {
            return Ok(observed.replicas);
        }

        // Give concurrent writers a chance to interleave between read and write.
        tokio::task::yield_now().await;

        self.compare_and_swap(target, observed.resource_version, replicas)
            .await
    }
}

#[async_trait]
impl ReplicaStore for InMemoryReplicaStore {
    async fn fetch_replicas(&self, target: &DeploymentRef) -> Result<ReplicaCount, ReplicaStoreError> {
        self.read(target).await.map(|d| d.replicas)
    }

    async fn apply_replicas(
        &self,
        target: &DeploymentRef,
        replicas: ReplicaCount,
    ) -> Result<ReplicaCount, ReplicaStoreError> {
        retry_on_conflict(self.retry, move |_| self.apply_once(target, replicas)).await
    }
}
