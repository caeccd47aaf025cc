use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::errors::internal_error;

/// Build the main application router
pub fn app_router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Replica control
        .nest("/deployments", crate::api::routes::deployment_routes::deployment_routes())
        // Fallback handler for 404
        .fallback(handler_404)
        // A panicking handler becomes a 500 instead of taking the worker down
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}

// Handler for health check
async fn health_check() -> &'static str {
    "ok"
}

// Handler for 404 Not Found
async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        "The requested resource was not found",
    )
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    // Logged once, by `AppError::into_response`.
    internal_error(format!("handler panicked: {}", detail)).into_response()
}
