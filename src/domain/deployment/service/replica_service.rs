use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::core::client::error_classifier::{ReplicaErrorKind, ReplicaStoreError};
use crate::core::client::replica_store::ReplicaStore;
use crate::domain::deployment::model::{DeploymentRef, ReplicaCount};

/// Runs replica reads and writes against a [`ReplicaStore`] under a per-call
/// deadline. A call that outlives the deadline is dropped and reported as
/// `Unknown`; conflict retries never continue past it.
#[derive(Clone)]
pub struct ReplicaService {
    store: Arc<dyn ReplicaStore>,
    deadline: Duration,
}

impl ReplicaService {
    pub fn new(store: Arc<dyn ReplicaStore>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub async fn get_replicas(&self, target: &DeploymentRef) -> Result<ReplicaCount, ReplicaStoreError> {
        let result = self
            .with_deadline(target, self.store.fetch_replicas(target))
            .await;

        log_outcome("get_replicas", target, &result);
        result
    }

    pub async fn set_replicas(
        &self,
        target: &DeploymentRef,
        replicas: ReplicaCount,
    ) -> Result<ReplicaCount, ReplicaStoreError> {
        let result = self
            .with_deadline(target, self.store.apply_replicas(target, replicas))
            .await;

        if let Ok(applied) = &result {
            info!(
                namespace = target.namespace(),
                name = target.name(),
                requested = replicas,
                applied = *applied,
                "Desired replica count updated"
            );
        }
        log_outcome("set_replicas", target, &result);
        result
    }

    async fn with_deadline<F>(&self, target: &DeploymentRef, call: F) -> Result<ReplicaCount, ReplicaStoreError>
    where
        F: Future<Output = Result<ReplicaCount, ReplicaStoreError>>,
    {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(ReplicaStoreError::unknown(format!(
                "deadline of {:?} exceeded for {}",
                self.deadline, target
            ))),
        }
    }
}

fn log_outcome(operation: &str, target: &DeploymentRef, result: &Result<ReplicaCount, ReplicaStoreError>) {
    let Err(err) = result else {
        return;
    };

    let kind = err.kind();
    match kind {
        ReplicaErrorKind::Unknown => warn!(
            operation,
            namespace = target.namespace(),
            name = target.name(),
            kind = %kind,
            error = %err,
            "Replica operation failed"
        ),
        _ => info!(
            operation,
            namespace = target.namespace(),
            name = target.name(),
            kind = %kind,
            error = %err,
            "Replica operation rejected"
        ),
    }
}
