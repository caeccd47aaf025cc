//! Deployment routes (e.g., /deployments/{namespace}/{name}/replicas)

use axum::{routing::get, Router};
use crate::api::controller::deployment::DeploymentReplicaController;
use crate::app_state::AppState;

pub fn deployment_routes() -> Router<AppState> {
    Router::new().route(
        "/{namespace}/{name}/replicas",
        get(DeploymentReplicaController::get_replicas)
            .put(DeploymentReplicaController::set_replicas),
    )
}
