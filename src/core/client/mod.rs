// Kube-rs based Kubernetes client
pub mod kube_client;
pub mod kube_resources;
pub mod namespaces;
pub mod deployments;

// Replica adapter
pub mod error_classifier;
pub mod conflict_retry;
pub mod replica_store;
#[cfg(any(test, feature = "test-util"))]
pub mod in_memory_store;
