use std::sync::Arc;
use std::time::Duration;

use crate::core::client::replica_store::ReplicaStore;
use crate::domain::deployment::service::replica_service::ReplicaService;

#[derive(Clone)]
pub struct AppState {
    pub replica_service: Arc<ReplicaService>,
}

/// Wire the replica service over the given store. `request_deadline` bounds
/// every store call made on behalf of a request.
pub fn build_app_state(store: Arc<dyn ReplicaStore>, request_deadline: Duration) -> AppState {
    AppState {
        replica_service: Arc::new(ReplicaService::new(store, request_deadline)),
    }
}
