//! Ready-made values for tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use flights_core::flight::{AircraftId, Flight, FlightId, FlightStatus};
use uuid::Uuid;

/// 2025-01-01T10:00:00Z
#[must_use]
pub fn departure() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
}

/// 2025-01-01T15:00:00Z, five hours after [`departure`].
#[must_use]
pub fn arrival() -> DateTime<Utc> {
    departure() + Duration::hours(5)
}

/// A fresh random aircraft id.
#[must_use]
pub fn aircraft_id() -> AircraftId {
    AircraftId::from_uuid(Uuid::new_v4())
}

/// A valid, normalised, not-yet-stored flight `AA123` from LAX to JFK.
#[must_use]
pub fn flight() -> Flight {
    Flight {
        id: FlightId::new(),
        number: "AA123".to_string(),
        origin: "LAX".to_string(),
        destination: "JFK".to_string(),
        departure_time: departure(),
        arrival_time: arrival(),
        status: FlightStatus::Scheduled,
        aircraft_id: aircraft_id(),
        created_by: None,
        last_updated_by: None,
        organization_id: None,
        created_at: None,
        updated_at: None,
    }
}

/// Like [`flight`], with store timestamps set.
#[must_use]
pub fn stored_flight() -> Flight {
    let mut flight = flight();
    let now = Utc::now();
    flight.created_at = Some(now);
    flight.updated_at = Some(now);
    flight
}
