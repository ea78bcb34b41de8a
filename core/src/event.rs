//! The `FlightCreated` event published after a flight is stored.
//!
//! # Schema (version 1)
//!
//! | Field | Type | Notes |
//! |-------|------|-------|
//! | `flightId` | string | UUID, also the partition key |
//! | `number` | string | normalised flight number |
//! | `origin` | string | IATA code |
//! | `destination` | string | IATA code |
//! | `departureTime` | string | RFC 3339, UTC, second precision |
//! | `arrivalTime` | string | RFC 3339, UTC, second precision |
//! | `airline` | string | first two characters of `number` |
//! | `status` | string | status tag, e.g. `SCHEDULED` |
//!
//! Timestamps are always RFC 3339 strings in this schema version. A change of
//! encoding requires a new [`SCHEMA_VERSION`].

use crate::flight::Flight;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

/// Event type tag, sent in the `eventType` message header.
pub const FLIGHT_CREATED: &str = "FlightCreated";

/// Current schema version of [`FlightCreated`].
pub const SCHEMA_VERSION: u32 = 1;

/// Header carrying the event type.
pub const EVENT_TYPE_HEADER: &str = "eventType";

/// Header carrying the schema version.
pub const SCHEMA_VERSION_HEADER: &str = "schemaVersion";

/// Fact: a flight was created and durably stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightCreated {
    /// Flight id
    pub flight_id: String,
    /// Flight number
    pub number: String,
    /// Origin IATA code
    pub origin: String,
    /// Destination IATA code
    pub destination: String,
    /// Departure, RFC 3339
    pub departure_time: String,
    /// Arrival, RFC 3339
    pub arrival_time: String,
    /// Airline designator
    pub airline: String,
    /// Status tag
    pub status: String,
}

impl FlightCreated {
    /// Build the event payload for a stored flight.
    ///
    /// The flight number must be normalised (see [`Flight::airline`]).
    #[must_use]
    pub fn from_flight(flight: &Flight) -> Self {
        Self {
            flight_id: flight.id.to_string(),
            number: flight.number.clone(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            departure_time: flight.departure_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            arrival_time: flight.arrival_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            airline: flight.airline().to_string(),
            status: flight.status.as_str().to_string(),
        }
    }
}
