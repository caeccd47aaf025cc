//! Deployment replica controller: connects routes to the replica service

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::debug;
use validator::Validate;

use crate::api::dto::replica_dto::{ScaleRequest, ScaleResponse};
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::domain::deployment::model::{DeploymentRef, ReplicaCount};
use crate::errors::AppError;

pub struct DeploymentReplicaController;

impl DeploymentReplicaController {
    pub async fn get_replicas(
        State(state): State<AppState>,
        Path((namespace, name)): Path<(String, String)>,
    ) -> Result<Json<ScaleResponse>, AppError> {
        let target = deployment_ref(namespace, name)?;

        to_json(
            state
                .replica_service
                .get_replicas(&target)
                .await
                .map(ScaleResponse::from),
        )
    }

    /// The body is fully validated before the cluster is contacted.
    pub async fn set_replicas(
        State(state): State<AppState>,
        Path((namespace, name)): Path<(String, String)>,
        payload: Result<Json<ScaleRequest>, JsonRejection>,
    ) -> Result<Json<ScaleResponse>, AppError> {
        let target = deployment_ref(namespace, name)?;
        let replicas = scale_target(payload)?;

        to_json(
            state
                .replica_service
                .set_replicas(&target, replicas)
                .await
                .map(ScaleResponse::from),
        )
    }
}

fn deployment_ref(namespace: String, name: String) -> Result<DeploymentRef, AppError> {
    DeploymentRef::new(namespace, name).map_err(|e| AppError::ValidationError(e.to_string()))
}

fn scale_target(payload: Result<Json<ScaleRequest>, JsonRejection>) -> Result<ReplicaCount, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected scale request body: {}", rejection.body_text());
        AppError::ValidationError(rejection.body_text())
    })?;

    request
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    ReplicaCount::try_from(request.replicas)
        .map_err(|_| AppError::ValidationError("replicas: out of range".to_string()))
}
