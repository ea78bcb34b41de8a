//! The flight entity and its identifiers.
//!
//! A [`Flight`] is created exactly once by the orchestration service. The
//! durable store owns the record and assigns `created_at`/`updated_at`; every
//! other copy (cache entries, events) is disposable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a flight.
///
/// Generated by the orchestration service at creation time and immutable afterwards.
///
/// # Examples
///
/// ```
/// use flights_core::flight::FlightId;
///
/// let id = FlightId::new();
/// let parsed: FlightId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(Uuid);

impl FlightId {
    /// Creates a new random `FlightId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `FlightId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FlightId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FlightId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Identifier of an aircraft owned by the aircraft service.
///
/// Flights reference aircraft; they never own them. Existence is checked once,
/// at creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AircraftId(Uuid);

impl AircraftId {
    /// Create an `AircraftId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AircraftId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Operational status of a flight.
///
/// Flights are created as [`FlightStatus::Scheduled`]. The string tags
/// (`SCHEDULED`, `IN_PROGRESS`, ...) are the representation used in JSON, in the
/// database and in events. Unknown tags map to [`FlightStatus::Unspecified`]
/// rather than failing, so older readers survive newer writers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FlightStatus {
    /// Planned and not yet departed
    Scheduled,
    /// Departure pushed back
    Delayed,
    /// Left the gate
    Departed,
    /// Airborne
    InProgress,
    /// Landed at destination
    Arrived,
    /// Will not operate
    Cancelled,
    /// Unknown or unrecognised status
    #[default]
    Unspecified,
}

impl FlightStatus {
    /// Every status, in wire-code order.
    pub const ALL: [Self; 7] = [
        Self::Unspecified,
        Self::Scheduled,
        Self::Delayed,
        Self::Departed,
        Self::InProgress,
        Self::Arrived,
        Self::Cancelled,
    ];

    /// String tag used in JSON, SQL and events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Delayed => "DELAYED",
            Self::Departed => "DEPARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Arrived => "ARRIVED",
            Self::Cancelled => "CANCELLED",
            Self::Unspecified => "UNSPECIFIED",
        }
    }

    /// Parse a string tag. Unrecognised tags become [`FlightStatus::Unspecified`].
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "SCHEDULED" => Self::Scheduled,
            "DELAYED" => Self::Delayed,
            "DEPARTED" => Self::Departed,
            "IN_PROGRESS" => Self::InProgress,
            "ARRIVED" => Self::Arrived,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Unspecified,
        }
    }

    /// Numeric code for binary transports (0 is always `Unspecified`).
    #[must_use]
    pub const fn to_wire_code(self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::Scheduled => 1,
            Self::Delayed => 2,
            Self::Departed => 3,
            Self::InProgress => 4,
            Self::Arrived => 5,
            Self::Cancelled => 6,
        }
    }

    /// Inverse of [`FlightStatus::to_wire_code`]. Unknown codes become `Unspecified`.
    #[must_use]
    pub const fn from_wire_code(code: i32) -> Self {
        match code {
            1 => Self::Scheduled,
            2 => Self::Delayed,
            3 => Self::Departed,
            4 => Self::InProgress,
            5 => Self::Arrived,
            6 => Self::Cancelled,
            _ => Self::Unspecified,
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FlightStatus {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<FlightStatus> for String {
    fn from(status: FlightStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A scheduled flight.
///
/// `number`, `origin` and `destination` are always stored in normalised
/// (trimmed, upper-case) form. `created_at`/`updated_at` are `None` until the
/// store has accepted the record.
///
/// Audit fields are persisted but skipped during serialization, so they never
/// reach cache entries or JSON responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Unique identifier
    pub id: FlightId,
    /// Airline code plus numeric suffix, e.g. `BA123`
    pub number: String,
    /// Origin IATA code
    pub origin: String,
    /// Destination IATA code
    pub destination: String,
    /// Scheduled departure
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival (strictly after departure)
    pub arrival_time: DateTime<Utc>,
    /// Current status
    pub status: FlightStatus,
    /// Aircraft operating the flight
    pub aircraft_id: AircraftId,
    /// User that created the record
    #[serde(skip)]
    pub created_by: Option<Uuid>,
    /// User that last modified the record
    #[serde(skip)]
    pub last_updated_by: Option<Uuid>,
    /// Owning organization
    #[serde(skip)]
    pub organization_id: Option<Uuid>,
    /// Set by the store on insert
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store on every write
    pub updated_at: Option<DateTime<Utc>>,
}

impl Flight {
    /// Airline designator derived from the flight number (its first two characters).
    ///
    /// The flight number must already be normalised: validation guarantees at least
    /// two ASCII letters before the digits. For a malformed number shorter than two
    /// characters the whole number is returned instead of panicking.
    #[must_use]
    pub fn airline(&self) -> &str {
        self.number.get(..2).unwrap_or(&self.number)
    }
}
