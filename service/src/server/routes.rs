//! Router configuration.

use super::handlers::{create_flight, get_flight};
use super::health::health_check;
use super::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Build the complete router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/flights", post(create_flight))
        .route("/flights/:id", get(get_flight))
        .with_state(state)
}
