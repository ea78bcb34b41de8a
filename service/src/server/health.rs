//! Liveness endpoint.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `UP` while the process serves requests
    pub status: String,
    /// Service version
    pub version: String,
}

/// Returns 200 while the server is running. Dependencies are not checked.
///
/// ```bash
/// curl http://localhost:8081/health
/// # {"status":"UP","version":"0.1.0"}
/// ```
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    tracing::debug!("Health check");
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "UP".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
