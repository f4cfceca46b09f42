use axum::Router;
use axum::routing::get;
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

// The platform is pointed at /webhook; `/` is kept for deployments that mount
// the function at its root.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(handlers::verify_handler).post(handlers::webhook_handler),
        )
        .route(
            "/",
            get(handlers::verify_handler).post(handlers::webhook_handler),
        )
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(state)
}
