//! Re-export the Kubernetes resource types the replica adapter touches.

pub use k8s_openapi::api::core::v1::Namespace;

pub use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
