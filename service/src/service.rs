//! Flight orchestration.
//!
//! [`FlightService`] owns the two operations the transport adapters call:
//!
//! - [`FlightService::create_flight`]: validate, check the aircraft, store, then
//!   best-effort cache and publish
//! - [`FlightService::get_flight_by_id`]: cache-aside lookup with backfill
//!
//! Store, validation and aircraft failures abort and propagate. Cache and
//! publish failures are logged, counted and swallowed.
//!
//! # Example
//!
//! ```
//! use flights_core::cache::NoopFlightCache;
//! use flights_service::FlightService;
//! use flights_testing::{InMemoryFlightStore, StubAircraftValidator};
//! use std::sync::Arc;
//!
//! let service = FlightService::builder(
//!     Arc::new(InMemoryFlightStore::new()),
//!     Arc::new(StubAircraftValidator::existing()),
//! )
//! .cache(Arc::new(NoopFlightCache))
//! .build();
//! # let _ = service;
//! ```

use chrono::{DateTime, Utc};
use flights_core::aircraft::ExistenceValidator;
use flights_core::cache::{FlightCache, NoopFlightCache};
use flights_core::context::RequestContext;
use flights_core::error::FlightError;
use flights_core::flight::{AircraftId, Flight, FlightId, FlightStatus};
use flights_core::publisher::{FlightEventPublisher, NoopEventPublisher};
use flights_core::store::FlightStore;
use flights_core::validation::validate_new_flight;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Raw arguments for [`FlightService::create_flight`], as decoded by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFlight {
    /// Flight number, any case, may be padded
    pub number: String,
    /// Origin IATA code, any case, may be padded
    pub origin: String,
    /// Destination IATA code, any case, may be padded
    pub destination: String,
    /// Scheduled departure
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival
    pub arrival_time: DateTime<Utc>,
    /// Aircraft operating the flight
    pub aircraft_id: AircraftId,
}

/// Creates and looks up flights.
///
/// Holds only shared references to its collaborators, so one instance can
/// serve every request.
#[derive(Clone)]
pub struct FlightService {
    store: Arc<dyn FlightStore>,
    validator: Arc<dyn ExistenceValidator>,
    cache: Arc<dyn FlightCache>,
    publisher: Arc<dyn FlightEventPublisher>,
}

impl FlightService {
    /// Start building a service around its two mandatory collaborators.
    ///
    /// Cache and publisher default to no-ops.
    #[must_use]
    pub fn builder(
        store: Arc<dyn FlightStore>,
        validator: Arc<dyn ExistenceValidator>,
    ) -> FlightServiceBuilder {
        FlightServiceBuilder {
            store,
            validator,
            cache: Arc::new(NoopFlightCache),
            publisher: Arc::new(NoopEventPublisher),
        }
    }

    /// Create a flight.
    ///
    /// Validation runs first and touches no collaborator. The aircraft check
    /// and the store write abort on failure; caching and publishing do not.
    ///
    /// # Errors
    ///
    /// - [`FlightError::Validation`] for rejected input
    /// - [`FlightError::AircraftNotFound`] if the aircraft does not exist
    /// - [`FlightError::DownstreamUnavailable`] if the aircraft service cannot answer
    /// - [`FlightError::AlreadyExists`] if the number already departs at that time
    /// - [`FlightError::Store`] for any other persistence failure
    /// - [`FlightError::Cancelled`] if `cancel` fires before the store write completes
    pub async fn create_flight(
        &self,
        request: NewFlight,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Result<Flight, FlightError> {
        let result = self.create(request, context, cancel).await;
        match &result {
            Ok(flight) => {
                metrics::counter!("flights_created_total").increment(1);
                tracing::info!(
                    flight_id = %flight.id,
                    number = %flight.number,
                    aircraft_id = %flight.aircraft_id,
                    "Flight created"
                );
            }
            Err(error) => {
                metrics::counter!(
                    "flights_create_failures_total",
                    "kind" => error.kind().as_str()
                )
                .increment(1);
            }
        }
        result
    }

    async fn create(
        &self,
        request: NewFlight,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Result<Flight, FlightError> {
        let valid = validate_new_flight(
            &request.number,
            &request.origin,
            &request.destination,
            request.departure_time,
            request.arrival_time,
        )
        .inspect_err(|e| tracing::debug!(number = %request.number, error = %e, "Rejected flight"))?;

        guarded(cancel, self.validator.exists(request.aircraft_id))
            .await?
            .map_err(|e| {
                let error = FlightError::from(e);
                if matches!(error, FlightError::DownstreamUnavailable(_)) {
                    tracing::error!(aircraft_id = %request.aircraft_id, error = %error, "Aircraft check failed");
                } else {
                    tracing::debug!(aircraft_id = %request.aircraft_id, "Aircraft not found");
                }
                error
            })?;

        let mut flight = Flight {
            id: FlightId::new(),
            number: valid.number,
            origin: valid.origin,
            destination: valid.destination,
            departure_time: valid.departure,
            arrival_time: valid.arrival,
            status: FlightStatus::Scheduled,
            aircraft_id: request.aircraft_id,
            created_by: context.user_id,
            last_updated_by: context.user_id,
            organization_id: context.organization_id,
            created_at: None,
            updated_at: None,
        };

        let stamps = guarded(cancel, self.store.create_flight(&flight))
            .await?
            .map_err(|e| {
                let error = FlightError::from(e);
                if matches!(error, FlightError::AlreadyExists { .. }) {
                    tracing::debug!(number = %flight.number, departure = %flight.departure_time, "Duplicate flight");
                } else {
                    tracing::error!(flight_id = %flight.id, error = %error, "Failed to store flight");
                }
                error
            })?;
        flight.created_at = Some(stamps.created_at);
        flight.updated_at = Some(stamps.updated_at);

        self.cache_best_effort(&flight, cancel).await;

        if let Err(error) = self.publisher.publish_flight_created(&flight, cancel).await {
            best_effort_failure("publish");
            tracing::warn!(
                flight_id = %flight.id,
                kind = error.kind(),
                error = %error,
                "Failed to publish FlightCreated event"
            );
        }

        Ok(flight)
    }

    /// Look up a flight, cache first.
    ///
    /// A cache hit never touches the store. A store hit is written back to the
    /// cache before returning. Cache failures are treated as misses.
    ///
    /// # Errors
    ///
    /// - [`FlightError::FlightNotFound`] if no such flight exists
    /// - [`FlightError::Store`] if the store cannot be read
    /// - [`FlightError::Cancelled`] if `cancel` fires before the lookup completes
    pub async fn get_flight_by_id(
        &self,
        id: FlightId,
        cancel: &CancellationToken,
    ) -> Result<Flight, FlightError> {
        match guarded(cancel, self.cache.get_flight(id)).await? {
            Ok(Some(flight)) => {
                lookup("cache");
                return Ok(flight);
            }
            Ok(None) => {}
            Err(error) => {
                best_effort_failure("cache_get");
                tracing::warn!(flight_id = %id, error = %error, "Flight cache read failed, using store");
            }
        }

        let flight = guarded(cancel, self.store.get_flight_by_id(id))
            .await?
            .map_err(|e| {
                let error = FlightError::from(e);
                if !matches!(error, FlightError::FlightNotFound(_)) {
                    tracing::error!(flight_id = %id, error = %error, "Failed to load flight");
                }
                error
            })?;
        lookup("store");

        self.cache_best_effort(&flight, cancel).await;
        Ok(flight)
    }

    async fn cache_best_effort(&self, flight: &Flight, cancel: &CancellationToken) {
        match guarded(cancel, self.cache.set_flight(flight)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                best_effort_failure("cache_set");
                tracing::warn!(flight_id = %flight.id, error = %error, "Failed to cache flight");
            }
            Err(_) => {
                tracing::debug!(flight_id = %flight.id, "Cache write abandoned, request cancelled");
            }
        }
    }
}

/// Builder for [`FlightService`].
pub struct FlightServiceBuilder {
    store: Arc<dyn FlightStore>,
    validator: Arc<dyn ExistenceValidator>,
    cache: Arc<dyn FlightCache>,
    publisher: Arc<dyn FlightEventPublisher>,
}

impl FlightServiceBuilder {
    /// Use this cache
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn FlightCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Use this event publisher
    #[must_use]
    pub fn publisher(mut self, publisher: Arc<dyn FlightEventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> FlightService {
        FlightService {
            store: self.store,
            validator: self.validator,
            cache: self.cache,
            publisher: self.publisher,
        }
    }
}

/// Race a collaborator call against cancellation.
async fn guarded<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = T>,
) -> Result<T, FlightError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(FlightError::Cancelled),
        out = call => Ok(out),
    }
}

fn lookup(source: &'static str) {
    metrics::counter!("flights_lookups_total", "source" => source).increment(1);
}

fn best_effort_failure(operation: &'static str) {
    metrics::counter!("flights_best_effort_failures_total", "operation" => operation).increment(1);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn guarded_returns_the_call_result() {
        let cancel = CancellationToken::new();
        assert_eq!(guarded(&cancel, async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn guarded_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(guarded(&cancel, async { 7 }).await, Err(FlightError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn guarded_stops_waiting_once_cancelled() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let out = guarded(&cancel, tokio::time::sleep(Duration::from_secs(3600))).await;
        assert_eq!(out, Err(FlightError::Cancelled));
    }
}
