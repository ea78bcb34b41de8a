//! In-memory flight collaborators for fast, deterministic service tests.
//!
//! Each fake doubles as a spy:
//! - [`InMemoryFlightStore`]: HashMap-backed store enforcing `(number, departure_time)` uniqueness
//! - [`InMemoryFlightCache`]: HashMap-backed cache with injectable failures
//! - [`StubAircraftValidator`]: scripted aircraft existence answers
//! - [`RecordingEventPublisher`]: records every published flight
//!
//! All of them are cheap to clone; clones share state, so a test can keep one
//! handle for assertions and give another to the service.

use chrono::Utc;
use flights_core::aircraft::{ExistenceError, ExistenceValidator};
use flights_core::cache::{CacheError, FlightCache};
use flights_core::flight::{AircraftId, Flight, FlightId};
use flights_core::publisher::{FlightEventPublisher, PublishError};
use flights_core::store::{FlightStore, RecordTimestamps, StoreError};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// In-memory flight store.
///
/// # Example
///
/// ```
/// use flights_testing::{InMemoryFlightStore, fixtures};
/// use flights_core::store::FlightStore;
///
/// # async fn example() {
/// let store = InMemoryFlightStore::new();
/// let flight = fixtures::flight();
/// store.create_flight(&flight).await.unwrap();
///
/// assert_eq!(store.len(), 1);
/// assert!(store.create_flight(&flight).await.is_err());
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryFlightStore {
    flights: Arc<RwLock<HashMap<FlightId, Flight>>>,
    create_failure: Arc<RwLock<Option<String>>>,
    read_failure: Arc<RwLock<Option<String>>>,
    create_delay: Arc<RwLock<Option<Duration>>>,
    create_calls: Arc<AtomicUsize>,
    get_calls: Arc<AtomicUsize>,
}

impl InMemoryFlightStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a flight directly, bypassing uniqueness checks and call counters.
    pub fn seed(&self, flight: Flight) {
        self.flights.write().unwrap().insert(flight.id, flight);
    }

    /// Make every subsequent insert fail with a database error.
    pub fn fail_creates_with(&self, reason: impl Into<String>) {
        *self.create_failure.write().unwrap() = Some(reason.into());
    }

    /// Make every subsequent read fail with a database error.
    pub fn fail_reads_with(&self, reason: impl Into<String>) {
        *self.read_failure.write().unwrap() = Some(reason.into());
    }

    /// Delay every insert, to give tests a window for cancellation.
    pub fn delay_creates(&self, delay: Duration) {
        *self.create_delay.write().unwrap() = Some(delay);
    }

    /// Stored copy of a flight
    #[must_use]
    pub fn get(&self, id: FlightId) -> Option<Flight> {
        self.flights.read().unwrap().get(&id).cloned()
    }

    /// Number of stored flights
    #[must_use]
    pub fn len(&self) -> usize {
        self.flights.read().unwrap().len()
    }

    /// Whether nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flights.read().unwrap().is_empty()
    }

    /// How many times `create_flight` was called
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// How many times `get_flight_by_id` was called
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

impl FlightStore for InMemoryFlightStore {
    fn create_flight<'a>(
        &'a self,
        flight: &'a Flight,
    ) -> Pin<Box<dyn Future<Output = Result<RecordTimestamps, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            self.create_calls.fetch_add(1, Ordering::SeqCst);

            let delay = *self.create_delay.read().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let failure = self.create_failure.read().unwrap().clone();
            if let Some(reason) = failure {
                return Err(StoreError::Database {
                    flight_id: flight.id,
                    reason,
                });
            }

            let mut flights = self.flights.write().unwrap();
            let taken = flights.values().any(|existing| {
                existing.number == flight.number && existing.departure_time == flight.departure_time
            });
            if taken {
                return Err(StoreError::Duplicate {
                    number: flight.number.clone(),
                    departure: flight.departure_time,
                });
            }

            let now = Utc::now();
            let mut stored = flight.clone();
            stored.created_at = Some(now);
            stored.updated_at = Some(now);
            flights.insert(stored.id, stored);

            Ok(RecordTimestamps {
                created_at: now,
                updated_at: now,
            })
        })
    }

    fn get_flight_by_id(
        &self,
        id: FlightId,
    ) -> Pin<Box<dyn Future<Output = Result<Flight, StoreError>> + Send + '_>> {
        Box::pin(async move {
            self.get_calls.fetch_add(1, Ordering::SeqCst);

            let failure = self.read_failure.read().unwrap().clone();
            if let Some(reason) = failure {
                return Err(StoreError::Database {
                    flight_id: id,
                    reason,
                });
            }

            self.get(id).ok_or(StoreError::NotFound(id))
        })
    }
}

/// In-memory flight cache.
#[derive(Clone, Debug, Default)]
pub struct InMemoryFlightCache {
    entries: Arc<RwLock<HashMap<FlightId, Flight>>>,
    get_failure: Arc<RwLock<Option<CacheError>>>,
    set_failure: Arc<RwLock<Option<CacheError>>>,
    set_delay: Arc<RwLock<Option<Duration>>>,
    get_calls: Arc<AtomicUsize>,
    set_calls: Arc<AtomicUsize>,
}

impl InMemoryFlightCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an entry in place without counting a `set_flight` call.
    pub fn seed(&self, flight: Flight) {
        self.entries.write().unwrap().insert(flight.id, flight);
    }

    /// Make every subsequent read fail.
    pub fn fail_gets_with(&self, error: CacheError) {
        *self.get_failure.write().unwrap() = Some(error);
    }

    /// Make every subsequent write fail.
    pub fn fail_sets_with(&self, error: CacheError) {
        *self.set_failure.write().unwrap() = Some(error);
    }

    /// Delay every write.
    pub fn delay_sets(&self, delay: Duration) {
        *self.set_delay.write().unwrap() = Some(delay);
    }

    /// Cached copy of a flight
    #[must_use]
    pub fn get(&self, id: FlightId) -> Option<Flight> {
        self.entries.read().unwrap().get(&id).cloned()
    }

    /// Whether the cache holds an entry for `id`
    #[must_use]
    pub fn contains(&self, id: FlightId) -> bool {
        self.entries.read().unwrap().contains_key(&id)
    }

    /// How many times `get_flight` was called
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// How many times `set_flight` was called
    #[must_use]
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }
}

impl FlightCache for InMemoryFlightCache {
    fn get_flight(
        &self,
        id: FlightId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Flight>, CacheError>> + Send + '_>> {
        Box::pin(async move {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.get_failure.read().unwrap().clone() {
                return Err(error);
            }
            Ok(self.get(id))
        })
    }

    fn set_flight<'a>(
        &'a self,
        flight: &'a Flight,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>> {
        Box::pin(async move {
            self.set_calls.fetch_add(1, Ordering::SeqCst);

            let delay = *self.set_delay.read().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(error) = self.set_failure.read().unwrap().clone() {
                return Err(error);
            }
            self.entries
                .write()
                .unwrap()
                .insert(flight.id, flight.clone());
            Ok(())
        })
    }
}

#[derive(Clone, Debug)]
enum AircraftAnswer {
    Exists,
    NotFound,
    Unavailable(String),
}

/// Aircraft validator with a scripted answer.
#[derive(Clone, Debug)]
pub struct StubAircraftValidator {
    answer: AircraftAnswer,
    delay: Option<Duration>,
    checked: Arc<RwLock<Vec<AircraftId>>>,
}

impl StubAircraftValidator {
    fn with_answer(answer: AircraftAnswer) -> Self {
        Self {
            answer,
            delay: None,
            checked: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Every aircraft exists.
    #[must_use]
    pub fn existing() -> Self {
        Self::with_answer(AircraftAnswer::Exists)
    }

    /// No aircraft exists.
    #[must_use]
    pub fn not_found() -> Self {
        Self::with_answer(AircraftAnswer::NotFound)
    }

    /// The aircraft service cannot be reached.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::with_answer(AircraftAnswer::Unavailable(reason.into()))
    }

    /// Wait before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many checks were made
    #[must_use]
    pub fn calls(&self) -> usize {
        self.checked.read().unwrap().len()
    }

    /// Aircraft ids checked, in call order
    #[must_use]
    pub fn checked_ids(&self) -> Vec<AircraftId> {
        self.checked.read().unwrap().clone()
    }
}

impl ExistenceValidator for StubAircraftValidator {
    fn exists(
        &self,
        aircraft_id: AircraftId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExistenceError>> + Send + '_>> {
        Box::pin(async move {
            self.checked.write().unwrap().push(aircraft_id);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.answer {
                AircraftAnswer::Exists => Ok(()),
                AircraftAnswer::NotFound => Err(ExistenceError::NotFound(aircraft_id)),
                AircraftAnswer::Unavailable(reason) => {
                    Err(ExistenceError::Unavailable(reason.clone()))
                }
            }
        })
    }
}

/// Publisher that records every flight it is asked to publish.
#[derive(Clone, Debug, Default)]
pub struct RecordingEventPublisher {
    published: Arc<RwLock<Vec<Flight>>>,
    failure: Arc<RwLock<Option<PublishError>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<AtomicUsize>,
}

impl RecordingEventPublisher {
    /// Create a publisher that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail.
    pub fn fail_with(&self, error: PublishError) {
        *self.failure.write().unwrap() = Some(error);
    }

    /// Delay every publish. A cancelled token cuts the delay short.
    pub fn delay_publishes(&self, delay: Duration) {
        *self.delay.write().unwrap() = Some(delay);
    }

    /// Flights successfully published, in order
    #[must_use]
    pub fn published(&self) -> Vec<Flight> {
        self.published.read().unwrap().clone()
    }

    /// How many publish attempts were made
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FlightEventPublisher for RecordingEventPublisher {
    fn publish_flight_created<'a>(
        &'a self,
        flight: &'a Flight,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let delay = *self.delay.read().unwrap();
            if let Some(delay) = delay {
                tokio::select! {
                    () = cancel.cancelled() => return Err(PublishError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }

            if let Some(error) = self.failure.read().unwrap().clone() {
                return Err(error);
            }
            self.published.write().unwrap().push(flight.clone());
            Ok(())
        })
    }
}
