use crate::handler;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Build the axum router with all reaction endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/reactions", post(handler::react_handler))
        .route("/v1/reactions/bulk", post(handler::react_bulk_handler))
        .route("/v1/reactions/:emoji/:item_id", get(handler::reaction_handler))
        .route("/v1/counts", get(handler::counts_handler))
        .with_state(state)
}
