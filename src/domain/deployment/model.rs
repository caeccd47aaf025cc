use std::fmt;

use thiserror::Error;

/// Desired instance count of a Deployment. Zero is a valid target.
pub type ReplicaCount = u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidDeploymentRef {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("deployment name must not be empty")]
    EmptyName,
}

/// Identifies a Deployment inside a namespace.
///
/// Only emptiness is checked here; naming rules are left to the API server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentRef {
    namespace: String,
    name: String,
}

impl DeploymentRef {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, InvalidDeploymentRef> {
        let namespace = namespace.into();
        let name = name.into();

        if namespace.is_empty() {
            return Err(InvalidDeploymentRef::EmptyNamespace);
        }
        if name.is_empty() {
            return Err(InvalidDeploymentRef::EmptyName);
        }

        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DeploymentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
