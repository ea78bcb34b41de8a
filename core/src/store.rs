//! Durable flight storage.
//!
//! The store is the single source of truth. It enforces the uniqueness of
//! `(number, departure_time)` itself, so the service never pre-checks for
//! duplicates and there is no race window between check and insert.
//!
//! # Implementations
//!
//! - `PostgresFlightStore` (in `flights-postgres`): production
//! - `InMemoryFlightStore` (in `flights-testing`): fast, deterministic tests

use crate::flight::{Flight, FlightId};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors reported by a [`FlightStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another flight already has this number and departure time.
    #[error("flight with number {number} at {departure} already exists")]
    Duplicate {
        /// Flight number of the rejected insert
        number: String,
        /// Departure time of the rejected insert
        departure: DateTime<Utc>,
    },

    /// No flight with this id.
    #[error("flight {0} not found")]
    NotFound(FlightId),

    /// Any other database failure.
    #[error("database error for flight {flight_id}: {reason}")]
    Database {
        /// Flight being written or read
        flight_id: FlightId,
        /// Underlying failure
        reason: String,
    },
}

/// Timestamps assigned by the store when a record is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordTimestamps {
    /// Insert time
    pub created_at: DateTime<Utc>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

/// Strongly consistent CRUD for flights.
///
/// Implementations must be `Send + Sync`; a single instance is shared by every
/// request.
///
/// # Dyn Compatibility
///
/// Methods return `Pin<Box<dyn Future>>` so the service can hold an
/// `Arc<dyn FlightStore>`.
pub trait FlightStore: Send + Sync {
    /// Insert a new flight and return the timestamps the store assigned.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Duplicate`] when `(number, departure_time)` is taken
    /// - [`StoreError::Database`] for any other failure
    fn create_flight<'a>(
        &'a self,
        flight: &'a Flight,
    ) -> Pin<Box<dyn Future<Output = Result<RecordTimestamps, StoreError>> + Send + 'a>>;

    /// Load a flight by id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] when no flight has this id
    /// - [`StoreError::Database`] for any other failure
    fn get_flight_by_id(
        &self,
        id: FlightId,
    ) -> Pin<Box<dyn Future<Output = Result<Flight, StoreError>> + Send + '_>>;
}
