use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::domain::deployment::model::DeploymentRef;

/// Closed set of failures a [`ReplicaStore`](super::replica_store::ReplicaStore) can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplicaStoreError {
    #[error("namespace '{namespace}' not found")]
    NamespaceNotFound { namespace: String },

    #[error("deployment '{target}' not found")]
    DeploymentNotFound { target: DeploymentRef },

    #[error("conflicting update on deployment '{target}'")]
    Conflict { target: DeploymentRef },

    #[error("cluster request failed: {detail}")]
    Unknown { detail: String },
}

/// Field-free discriminant of [`ReplicaStoreError`], used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaErrorKind {
    NamespaceNotFound,
    DeploymentNotFound,
    Conflict,
    Unknown,
}

impl fmt::Display for ReplicaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReplicaErrorKind::NamespaceNotFound => "namespace_not_found",
            ReplicaErrorKind::DeploymentNotFound => "deployment_not_found",
            ReplicaErrorKind::Conflict => "conflict",
            ReplicaErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl ReplicaStoreError {
    pub fn kind(&self) -> ReplicaErrorKind {
        match self {
            ReplicaStoreError::NamespaceNotFound { .. } => ReplicaErrorKind::NamespaceNotFound,
            ReplicaStoreError::DeploymentNotFound { .. } => ReplicaErrorKind::DeploymentNotFound,
            ReplicaStoreError::Conflict { .. } => ReplicaErrorKind::Conflict,
            ReplicaStoreError::Unknown { .. } => ReplicaErrorKind::Unknown,
        }
    }

    pub fn unknown<E: ToString>(err: E) -> Self {
        ReplicaStoreError::Unknown {
            detail: err.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ReplicaStoreError::Conflict { .. })
    }
}

/// The object a failed cluster call was addressing.
///
/// A 404 is attributed to this target, so namespace lookups must run before
/// deployment lookups for the two not-found cases to stay distinct.
#[derive(Debug, Clone, Copy)]
pub enum LookupTarget<'a> {
    Namespace(&'a str),
    Deployment(&'a DeploymentRef),
}

/// Map an API status code (or its absence) to a [`ReplicaStoreError`].
///
/// `None` means the request never produced an API status (transport error,
/// timeout, decode failure) and is always `Unknown`.
pub fn classify_status(
    code: Option<u16>,
    target: LookupTarget<'_>,
    detail: impl Into<String>,
) -> ReplicaStoreError {
    let status = code.and_then(|c| StatusCode::from_u16(c).ok());

    match (status, target) {
        (Some(StatusCode::NOT_FOUND), LookupTarget::Namespace(namespace)) => {
            ReplicaStoreError::NamespaceNotFound {
                namespace: namespace.to_string(),
            }
        }
        (Some(StatusCode::NOT_FOUND), LookupTarget::Deployment(target)) => {
            ReplicaStoreError::DeploymentNotFound {
                target: target.clone(),
            }
        }
        (Some(StatusCode::CONFLICT), LookupTarget::Deployment(target)) => {
            ReplicaStoreError::Conflict {
                target: target.clone(),
            }
        }
        _ => ReplicaStoreError::Unknown {
            detail: detail.into(),
        },
    }
}

/// Classify a kube-rs error raised while addressing `target`.
pub fn classify(err: &kube::Error, target: LookupTarget<'_>) -> ReplicaStoreError {
    classify_status(api_status_code(err), target, err.to_string())
}

fn api_status_code(err: &kube::Error) -> Option<u16> {
    match err {
        kube::Error::Api(response) => Some(response.code),
        _ => None,
    }
}
