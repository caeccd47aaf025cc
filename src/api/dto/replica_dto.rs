//! Replica API DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::deployment::model::ReplicaCount;

/// Body of `PUT /deployments/{namespace}/{name}/replicas`.
///
/// `replicas` is read as a signed integer so a negative value reaches
/// validation instead of failing as a type error; fractional and non-numeric
/// values are rejected by deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScaleRequest {
    #[validate(range(min = 0, max = 2147483647))]
    pub replicas: i64,
}

/// Replica count returned by both the read and write endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleResponse {
    pub replicas: ReplicaCount,
}

impl From<ReplicaCount> for ScaleResponse {
    fn from(replicas: ReplicaCount) -> Self {
        Self { replicas }
    }
}
