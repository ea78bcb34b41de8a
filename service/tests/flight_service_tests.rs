//! Behaviour of [`FlightService`] against in-memory collaborators.
//!
//! Every fake counts its calls, so "no I/O" and "never touches the store"
//! are asserted directly.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Duration as ChronoDuration;
use flights_core::cache::CacheError;
use flights_core::context::RequestContext;
use flights_core::error::{ErrorKind, FlightError, ValidationError};
use flights_core::flight::{FlightId, FlightStatus};
use flights_core::publisher::PublishError;
use flights_service::{FlightService, NewFlight};
use flights_testing::{
    InMemoryFlightCache, InMemoryFlightStore, RecordingEventPublisher, StubAircraftValidator,
    fixtures,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Harness {
    store: InMemoryFlightStore,
    cache: InMemoryFlightCache,
    validator: StubAircraftValidator,
    publisher: RecordingEventPublisher,
    service: FlightService,
}

impl Harness {
    fn new() -> Self {
        Self::with_validator(StubAircraftValidator::existing())
    }

    fn with_validator(validator: StubAircraftValidator) -> Self {
        let store = InMemoryFlightStore::new();
        let cache = InMemoryFlightCache::new();
        let publisher = RecordingEventPublisher::new();
        let service = FlightService::builder(Arc::new(store.clone()), Arc::new(validator.clone()))
            .cache(Arc::new(cache.clone()))
            .publisher(Arc::new(publisher.clone()))
            .build();
        Self {
            store,
            cache,
            validator,
            publisher,
            service,
        }
    }

    async fn create(&self, request: NewFlight) -> Result<flights_core::Flight, FlightError> {
        self.service
            .create_flight(request, &RequestContext::anonymous(), &CancellationToken::new())
            .await
    }

    fn assert_no_io(&self) {
        assert_eq!(self.validator.calls(), 0);
        assert_eq!(self.store.create_calls(), 0);
        assert_eq!(self.cache.set_calls(), 0);
        assert_eq!(self.publisher.calls(), 0);
    }
}

fn request() -> NewFlight {
    NewFlight {
        number: "aa123".to_string(),
        origin: "lax".to_string(),
        destination: "jfk".to_string(),
        departure_time: fixtures::departure(),
        arrival_time: fixtures::arrival(),
        aircraft_id: fixtures::aircraft_id(),
    }
}

#[tokio::test]
async fn creates_a_normalised_scheduled_flight() {
    let harness = Harness::new();
    let request = request();
    let aircraft_id = request.aircraft_id;

    let flight = harness.create(request).await.unwrap();

    assert_eq!(flight.number, "AA123");
    assert_eq!(flight.origin, "LAX");
    assert_eq!(flight.destination, "JFK");
    assert_eq!(flight.status, FlightStatus::Scheduled);
    assert_eq!(flight.aircraft_id, aircraft_id);
    assert!(!flight.id.as_uuid().is_nil());
    assert!(flight.created_at.is_some());
    assert!(flight.updated_at.is_some());

    let stored = harness.store.get(flight.id).expect("Flight should be stored");
    assert_eq!(stored.created_at, flight.created_at);
    assert_eq!(harness.validator.checked_ids(), vec![aircraft_id]);
    assert_eq!(harness.cache.get(flight.id), Some(flight.clone()));
    assert_eq!(harness.publisher.published(), vec![flight]);
}

#[tokio::test]
async fn every_create_gets_a_fresh_id() {
    let harness = Harness::new();
    let first = harness.create(request()).await.unwrap();

    let mut second = request();
    second.departure_time += ChronoDuration::days(1);
    second.arrival_time += ChronoDuration::days(1);
    let second = harness.create(second).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(harness.store.len(), 2);
}

#[tokio::test]
async fn request_context_fills_audit_fields() {
    let harness = Harness::new();
    let user = Uuid::new_v4();
    let org = Uuid::new_v4();

    let flight = harness
        .service
        .create_flight(
            request(),
            &RequestContext::for_user(user, Some(org)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(flight.created_by, Some(user));
    assert_eq!(flight.last_updated_by, Some(user));
    assert_eq!(flight.organization_id, Some(org));
}

#[tokio::test]
async fn arrival_not_after_departure_is_rejected_without_io() {
    let harness = Harness::new();

    for offset in [0, -1, -60] {
        let mut request = request();
        request.arrival_time = request.departure_time + ChronoDuration::minutes(offset);

        let err = harness.create(request.clone()).await.unwrap_err();
        assert_eq!(
            err,
            FlightError::Validation(ValidationError::InvalidTimes {
                departure: request.departure_time,
                arrival: request.arrival_time,
            })
        );
    }
    harness.assert_no_io();
}

#[tokio::test]
async fn times_are_checked_before_the_flight_number() {
    let harness = Harness::new();
    let mut request = request();
    request.number = "123".to_string();
    request.arrival_time = request.departure_time;

    let err = harness.create(request).await.unwrap_err();
    assert!(matches!(
        err,
        FlightError::Validation(ValidationError::InvalidTimes { .. })
    ));
}

#[tokio::test]
async fn malformed_flight_numbers_are_rejected() {
    let harness = Harness::new();

    for number in ["123", "", "BA1212121212121"] {
        let mut request = request();
        request.number = number.to_string();
        assert_eq!(
            harness.create(request).await.unwrap_err(),
            FlightError::Validation(ValidationError::InvalidFlightNumber),
            "{number:?} should be rejected"
        );
    }
    harness.assert_no_io();
}

#[tokio::test]
async fn malformed_airports_are_rejected() {
    let harness = Harness::new();

    let mut bad_origin = request();
    bad_origin.origin = "JFK132".to_string();
    assert_eq!(
        harness.create(bad_origin).await.unwrap_err(),
        FlightError::Validation(ValidationError::InvalidIataCode)
    );

    let mut bad_destination = request();
    bad_destination.destination = "12".to_string();
    assert_eq!(
        harness.create(bad_destination).await.unwrap_err(),
        FlightError::Validation(ValidationError::InvalidIataCode)
    );

    harness.assert_no_io();
}

#[tokio::test]
async fn same_airport_is_checked_after_both_codes() {
    let harness = Harness::new();

    let mut same = request();
    same.origin = "JFK".to_string();
    same.destination = " jfk ".to_string();
    assert_eq!(
        harness.create(same).await.unwrap_err(),
        FlightError::Validation(ValidationError::SameOriginAndDestination)
    );

    let mut same_but_invalid = request();
    same_but_invalid.origin = "J1K".to_string();
    same_but_invalid.destination = "J1K".to_string();
    assert_eq!(
        harness.create(same_but_invalid).await.unwrap_err(),
        FlightError::Validation(ValidationError::InvalidIataCode)
    );

    harness.assert_no_io();
}

#[tokio::test]
async fn unknown_aircraft_never_reaches_the_store() {
    let harness = Harness::with_validator(StubAircraftValidator::not_found());
    let request = request();
    let aircraft_id = request.aircraft_id;

    let err = harness.create(request).await.unwrap_err();

    assert_eq!(err, FlightError::AircraftNotFound(aircraft_id));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(harness.store.create_calls(), 0);
    assert_eq!(harness.publisher.calls(), 0);
}

#[tokio::test]
async fn unreachable_aircraft_service_is_downstream_unavailable() {
    let harness = Harness::with_validator(StubAircraftValidator::unavailable("connection refused"));

    let err = harness.create(request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DownstreamUnavailable);
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(harness.store.create_calls(), 0);
}

#[tokio::test]
async fn duplicate_number_and_departure_is_a_conflict() {
    let harness = Harness::new();
    harness.create(request()).await.unwrap();

    let err = harness.create(request()).await.unwrap_err();

    assert_eq!(
        err,
        FlightError::AlreadyExists {
            number: "AA123".to_string(),
            departure: fixtures::departure(),
        }
    );
    assert_eq!(harness.store.len(), 1);
    assert_eq!(harness.publisher.calls(), 1);
}

#[tokio::test]
async fn store_failure_is_returned_and_skips_side_effects() {
    let harness = Harness::new();
    harness.store.fail_creates_with("connection reset");

    let err = harness.create(request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Store);
    assert_eq!(harness.cache.set_calls(), 0);
    assert_eq!(harness.publisher.calls(), 0);
}

#[tokio::test]
async fn cache_write_failure_does_not_fail_creation() {
    let harness = Harness::new();
    harness
        .cache
        .fail_sets_with(CacheError::Connection("redis down".to_string()));

    let flight = harness.create(request()).await.unwrap();

    assert_eq!(harness.cache.set_calls(), 1);
    assert!(harness.store.get(flight.id).is_some());
    assert_eq!(harness.publisher.published(), vec![flight]);
}

#[tokio::test]
async fn publish_failure_does_not_fail_creation() {
    let harness = Harness::new();
    harness
        .publisher
        .fail_with(PublishError::EnqueueTimeout(Duration::from_secs(2)));

    let flight = harness.create(request()).await.unwrap();

    assert_eq!(harness.publisher.calls(), 1);
    assert!(harness.publisher.published().is_empty());
    assert!(harness.store.get(flight.id).is_some());
}

#[tokio::test]
async fn serialization_failure_does_not_fail_creation() {
    let harness = Harness::new();
    harness
        .publisher
        .fail_with(PublishError::Serialization("bad schema".to_string()));

    assert!(harness.create(request()).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_aircraft_check_is_reported() {
    let harness = Harness::with_validator(
        StubAircraftValidator::existing().with_delay(Duration::from_secs(30)),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = harness
        .service
        .create_flight(request(), &RequestContext::anonymous(), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, FlightError::Cancelled);
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(harness.store.create_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_store_write_is_reported() {
    let harness = Harness::new();
    harness.store.delay_creates(Duration::from_secs(30));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = harness
        .service
        .create_flight(request(), &RequestContext::anonymous(), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, FlightError::Cancelled);
    assert_eq!(harness.publisher.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_after_the_store_write_still_returns_the_flight() {
    let harness = Harness::new();
    harness.cache.delay_sets(Duration::from_secs(30));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let flight = harness
        .service
        .create_flight(request(), &RequestContext::anonymous(), &cancel)
        .await
        .unwrap();

    assert!(harness.store.get(flight.id).is_some());
}

#[tokio::test]
async fn cache_hit_never_touches_the_store() {
    let harness = Harness::new();
    let flight = fixtures::stored_flight();
    harness.cache.seed(flight.clone());

    let found = harness
        .service
        .get_flight_by_id(flight.id, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(found, flight);
    assert_eq!(harness.store.get_calls(), 0);
    assert_eq!(harness.cache.set_calls(), 0);
}

#[tokio::test]
async fn cache_miss_reads_the_store_and_backfills() {
    let harness = Harness::new();
    let flight = fixtures::stored_flight();
    harness.store.seed(flight.clone());

    let found = harness
        .service
        .get_flight_by_id(flight.id, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(found, flight);
    assert_eq!(harness.store.get_calls(), 1);
    assert_eq!(harness.cache.get(flight.id), Some(flight));
}

#[tokio::test]
async fn cache_read_failure_falls_back_to_the_store() {
    let harness = Harness::new();
    let flight = fixtures::stored_flight();
    harness.store.seed(flight.clone());
    harness
        .cache
        .fail_gets_with(CacheError::Serialization("garbage".to_string()));

    let found = harness
        .service
        .get_flight_by_id(flight.id, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(found, flight);
    assert_eq!(harness.store.get_calls(), 1);
}

#[tokio::test]
async fn backfill_failure_is_swallowed() {
    let harness = Harness::new();
    let flight = fixtures::stored_flight();
    harness.store.seed(flight.clone());
    harness
        .cache
        .fail_sets_with(CacheError::Command("READONLY".to_string()));

    let found = harness
        .service
        .get_flight_by_id(flight.id, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(found, flight);
    assert_eq!(harness.cache.set_calls(), 1);
}

#[tokio::test]
async fn missing_flight_is_not_found_and_not_cached() {
    let harness = Harness::new();
    let id = FlightId::new();

    let err = harness
        .service
        .get_flight_by_id(id, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, FlightError::FlightNotFound(id));
    assert_eq!(harness.cache.set_calls(), 0);
}

#[tokio::test]
async fn store_read_failure_is_returned() {
    let harness = Harness::new();
    harness.store.fail_reads_with("timeout");

    let err = harness
        .service
        .get_flight_by_id(FlightId::new(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Store);
}

#[tokio::test]
async fn cancelled_lookup_reports_cancellation() {
    let harness = Harness::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = harness
        .service
        .get_flight_by_id(FlightId::new(), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, FlightError::Cancelled);
    assert_eq!(harness.store.get_calls(), 0);
}

#[tokio::test]
async fn default_collaborators_are_no_ops() {
    let store = InMemoryFlightStore::new();
    let service = FlightService::builder(
        Arc::new(store.clone()),
        Arc::new(StubAircraftValidator::existing()),
    )
    .build();

    let flight = service
        .create_flight(request(), &RequestContext::anonymous(), &CancellationToken::new())
        .await
        .unwrap();
    let found = service
        .get_flight_by_id(flight.id, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(found.id, flight.id);
    assert_eq!(store.get_calls(), 1);
}

proptest! {
    #[test]
    fn padding_and_case_do_not_change_the_stored_number(
        airline in "[a-zA-Z]{2,3}",
        digits in "[0-9]{1,6}",
        pad in " {0,3}",
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let harness = Harness::new();
        let mut request = request();
        request.number = format!("{pad}{airline}{digits}{pad}");

        let flight = runtime.block_on(harness.create(request)).unwrap();

        prop_assert_eq!(flight.number, format!("{}{}", airline.to_uppercase(), digits));
    }
}
