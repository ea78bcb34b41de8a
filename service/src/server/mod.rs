//! HTTP transport for the flights service.
//!
//! - `POST /flights`: create a flight
//! - `GET /flights/:id`: look one up
//! - `GET /health`: liveness

pub mod error;
pub mod handlers;
pub mod health;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use health::health_check;
pub use routes::build_router;
pub use state::AppState;
