//! Pure validation and normalisation of flight input.
//!
//! Nothing here performs I/O. The orchestration service runs
//! [`validate_new_flight`] before touching any collaborator, so a rejected request
//! costs no network round-trips.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Longest accepted flight number, after trimming.
pub const MAX_FLIGHT_NUMBER_LEN: usize = 10;

#[allow(clippy::expect_used)] // literal patterns
static FLIGHT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}[0-9]{1,6}$").expect("flight number pattern"));

#[allow(clippy::expect_used)]
static IATA_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("IATA code pattern"));

/// Flight input that passed every validation rule, in normalised form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedFlight {
    /// Normalised flight number
    pub number: String,
    /// Normalised origin code
    pub origin: String,
    /// Normalised destination code
    pub destination: String,
    /// Departure time
    pub departure: DateTime<Utc>,
    /// Arrival time, strictly after departure
    pub arrival: DateTime<Utc>,
}

/// Trim and upper-case a flight number, then check its shape.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidFlightNumber`] for empty input, input longer than
/// [`MAX_FLIGHT_NUMBER_LEN`], or anything not matching `^[A-Z]{2,3}[0-9]{1,6}$`.
///
/// # Examples
///
/// ```
/// use flights_core::validation::normalize_flight_number;
///
/// assert_eq!(normalize_flight_number(" ba123 ").unwrap(), "BA123");
/// assert!(normalize_flight_number("123").is_err());
/// ```
pub fn normalize_flight_number(raw: &str) -> Result<String, ValidationError> {
    let normalized = raw.trim().to_uppercase();
    if normalized.is_empty()
        || normalized.len() > MAX_FLIGHT_NUMBER_LEN
        || !FLIGHT_NUMBER.is_match(&normalized)
    {
        return Err(ValidationError::InvalidFlightNumber);
    }
    Ok(normalized)
}

/// Trim and upper-case an airport code, then require exactly three letters.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidIataCode`] if the normalised code is not `^[A-Z]{3}$`.
pub fn normalize_iata_code(raw: &str) -> Result<String, ValidationError> {
    let normalized = raw.trim().to_uppercase();
    if !IATA_CODE.is_match(&normalized) {
        return Err(ValidationError::InvalidIataCode);
    }
    Ok(normalized)
}

/// Reject a route that starts and ends at the same airport.
///
/// Both codes must already be normalised.
///
/// # Errors
///
/// Returns [`ValidationError::SameOriginAndDestination`] when the codes are equal.
pub fn ensure_distinct_airports(origin: &str, destination: &str) -> Result<(), ValidationError> {
    if origin == destination {
        return Err(ValidationError::SameOriginAndDestination);
    }
    Ok(())
}

/// Require arrival strictly after departure.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimes`] carrying both timestamps otherwise.
pub fn ensure_arrival_after_departure(
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if arrival <= departure {
        return Err(ValidationError::InvalidTimes { departure, arrival });
    }
    Ok(())
}

/// Reject blank required fields, reporting all of them at once.
///
/// `fields` pairs a field name with its raw value; whitespace-only values count as
/// missing.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidInput`] listing every blank field in order.
///
/// # Examples
///
/// ```
/// use flights_core::validation::validate_required;
///
/// let err = validate_required(&[("number", "BA1"), ("origin", " "), ("destination", "")])
///     .unwrap_err();
/// assert_eq!(err.to_string(), "missing required field(s): origin, destination");
/// ```
pub fn validate_required(fields: &[(&str, &str)]) -> Result<(), ValidationError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| (*name).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidInput { fields: missing })
    }
}

/// Run every creation rule in order: times, number, origin, destination, distinct airports.
///
/// The first failure wins.
///
/// # Errors
///
/// Returns the [`ValidationError`] of the first rule that fails.
pub fn validate_new_flight(
    number: &str,
    origin: &str,
    destination: &str,
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
) -> Result<ValidatedFlight, ValidationError> {
    ensure_arrival_after_departure(departure, arrival)?;
    let number = normalize_flight_number(number)?;
    let origin = normalize_iata_code(origin)?;
    let destination = normalize_iata_code(destination)?;
    ensure_distinct_airports(&origin, &destination)?;

    Ok(ValidatedFlight {
        number,
        origin,
        destination,
        departure,
        arrival,
    })
}
