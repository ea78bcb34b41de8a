//! Flight endpoints.
//!
//! Handlers decode wire arguments, run required-field checks, call
//! [`FlightService`](crate::service::FlightService) and encode the result.
//! Each request gets its own [`CancellationToken`], cancelled when the
//! handler future is dropped (client disconnect).

use super::error::AppError;
use super::state::AppState;
use crate::service::NewFlight;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use flights_core::context::RequestContext;
use flights_core::error::FlightError;
use flights_core::flight::{AircraftId, Flight, FlightId};
use flights_core::validation::validate_required;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Header carrying the authenticated user's id, set by the gateway.
pub const USER_HEADER: &str = "x-user-sub";

/// Header carrying the caller's organization id, set by the gateway.
pub const ORGANIZATION_HEADER: &str = "x-org-id";

/// Body of `POST /flights`.
///
/// Text fields default to empty so that missing ones are reported together
/// by required-field validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlightRequest {
    /// Flight number, e.g. `ba123`
    #[serde(default)]
    pub number: String,
    /// Origin IATA code
    #[serde(default)]
    pub origin: String,
    /// Destination IATA code
    #[serde(default)]
    pub destination: String,
    /// Scheduled departure (RFC 3339)
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival (RFC 3339)
    pub arrival_time: DateTime<Utc>,
    /// Aircraft operating the flight
    pub aircraft_id: Uuid,
}

/// `POST /flights`
///
/// # Errors
///
/// Returns [`AppError`] for undecodable bodies and every [`FlightError`].
pub async fn create_flight(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateFlightRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    tracing::debug!(number = %request.number, "Create flight request");

    validate_required(&[
        ("number", request.number.as_str()),
        ("origin", request.origin.as_str()),
        ("destination", request.destination.as_str()),
    ])
    .map_err(FlightError::from)?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let context = request_context(&headers);

    let flight = state
        .flights
        .create_flight(
            NewFlight {
                number: request.number,
                origin: request.origin,
                destination: request.destination,
                departure_time: request.departure_time,
                arrival_time: request.arrival_time,
                aircraft_id: AircraftId::from_uuid(request.aircraft_id),
            },
            &context,
            &cancel,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(flight)))
}

/// `GET /flights/:id`
///
/// # Errors
///
/// Returns [`AppError`] for malformed ids and every [`FlightError`].
pub async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Flight>, AppError> {
    let id: FlightId = id
        .parse()
        .map_err(|_| AppError::bad_request(format!("invalid flight id: {id}")))?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let flight = state.flights.get_flight_by_id(id, &cancel).await?;
    Ok(Json(flight))
}

/// Caller identity from gateway headers. Absent or malformed values are ignored.
fn request_context(headers: &HeaderMap) -> RequestContext {
    let uuid_header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
    };

    RequestContext {
        user_id: uuid_header(USER_HEADER),
        organization_id: uuid_header(ORGANIZATION_HEADER),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn context_comes_from_gateway_headers() {
        let user = Uuid::new_v4();
        let org = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_str(&user.to_string()).unwrap());
        headers.insert(ORGANIZATION_HEADER, HeaderValue::from_str(&org.to_string()).unwrap());

        assert_eq!(request_context(&headers), RequestContext::for_user(user, Some(org)));
    }

    #[test]
    fn malformed_identity_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("not-a-uuid"));

        assert_eq!(request_context(&headers), RequestContext::anonymous());
        assert_eq!(request_context(&HeaderMap::new()), RequestContext::anonymous());
    }
}
