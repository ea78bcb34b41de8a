//! Error taxonomy for flight operations.
//!
//! [`FlightError`] is the only error the orchestration service returns. Transport
//! adapters map it onto their own status codes through [`FlightError::kind`]:
//!
//! | Kind | Meaning | Caller's fault |
//! |------|---------|----------------|
//! | `Validation` | input rejected before any I/O | yes |
//! | `NotFound` | flight or aircraft does not exist | yes |
//! | `Conflict` | same number already departs at that time | yes |
//! | `DownstreamUnavailable` | aircraft service unreachable | no |
//! | `Store` | any other persistence failure | no |
//! | `Cancelled` | caller cancelled the request | n/a |
//!
//! Cache and event-publication failures never appear here.

use crate::aircraft::ExistenceError;
use crate::flight::{AircraftId, FlightId};
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Input rejected by validation. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Flight number does not match `^[A-Z]{2,3}[0-9]{1,6}$` after normalisation
    #[error("flight number must contain airline code (2-3 letters) followed by digits, max 10 characters")]
    InvalidFlightNumber,

    /// IATA code is not exactly three letters
    #[error("IATA code must be exactly 3 uppercase letters A-Z")]
    InvalidIataCode,

    /// Origin and destination normalise to the same code
    #[error("duplicate origin and destination code")]
    SameOriginAndDestination,

    /// Arrival is not strictly after departure
    #[error("arrival must be after departure: departure={departure}, arrival={arrival}")]
    InvalidTimes {
        /// Requested departure
        departure: DateTime<Utc>,
        /// Requested arrival
        arrival: DateTime<Utc>,
    },

    /// Required fields were missing or blank
    #[error("missing required field(s): {}", .fields.join(", "))]
    InvalidInput {
        /// Names of the missing fields, in declaration order
        fields: Vec<String>,
    },
}

/// Coarse classification of a [`FlightError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied invalid input
    Validation,
    /// Referenced resource does not exist
    NotFound,
    /// Uniqueness constraint violated
    Conflict,
    /// A synchronous dependency could not be reached
    DownstreamUnavailable,
    /// Persistence failure
    Store,
    /// Caller cancelled the operation
    Cancelled,
}

impl ErrorKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::DownstreamUnavailable => "downstream_unavailable",
            Self::Store => "store",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Errors returned by the flight orchestration service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlightError {
    /// Input failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No flight with this id
    #[error("flight {0} not found")]
    FlightNotFound(FlightId),

    /// Referenced aircraft does not exist
    #[error("aircraft with id {0} not found")]
    AircraftNotFound(AircraftId),

    /// A flight with the same number already departs at this time
    #[error("flight with number {number} at {} already exists", .departure.to_rfc3339())]
    AlreadyExists {
        /// Normalised flight number
        number: String,
        /// Departure time of the clashing flight
        departure: DateTime<Utc>,
    },

    /// The aircraft service could not be reached
    #[error("downstream aircraft service unavailable: {0}")]
    DownstreamUnavailable(String),

    /// Persistence failed for a reason other than a conflict or a missing row
    #[error("store error for flight {flight_id}: {reason}")]
    Store {
        /// Flight being written or read
        flight_id: FlightId,
        /// Underlying failure
        reason: String,
    },

    /// The caller cancelled the request while it was in flight
    #[error("operation cancelled")]
    Cancelled,
}

impl FlightError {
    /// Classify this error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::FlightNotFound(_) | Self::AircraftNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::Conflict,
            Self::DownstreamUnavailable(_) => ErrorKind::DownstreamUnavailable,
            Self::Store { .. } => ErrorKind::Store,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<StoreError> for FlightError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { number, departure } => Self::AlreadyExists { number, departure },
            StoreError::NotFound(id) => Self::FlightNotFound(id),
            StoreError::Database { flight_id, reason } => Self::Store { flight_id, reason },
        }
    }
}

impl From<ExistenceError> for FlightError {
    fn from(err: ExistenceError) -> Self {
        match err {
            ExistenceError::NotFound(id) => Self::AircraftNotFound(id),
            ExistenceError::Unavailable(reason) => Self::DownstreamUnavailable(reason),
        }
    }
}
