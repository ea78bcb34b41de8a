//! Shared state for HTTP handlers.

use crate::service::FlightService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Flight orchestration service
    pub flights: Arc<FlightService>,
}

impl AppState {
    /// Wrap the service for the router.
    #[must_use]
    pub const fn new(flights: Arc<FlightService>) -> Self {
        Self { flights }
    }
}
