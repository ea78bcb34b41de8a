//! # Flights Testing
//!
//! Testing utilities for the flights service.
//!
//! This crate provides:
//! - In-memory implementations of every collaborator trait, each doubling as a spy
//!   that counts calls so "no I/O happened" can be asserted directly
//! - [`MockBroker`], a scriptable broker client for exercising the publisher
//! - Fixtures for valid flights and schedules
//!
//! ## Example
//!
//! ```ignore
//! use flights_testing::{InMemoryFlightStore, InMemoryFlightCache, StubAircraftValidator};
//!
//! #[tokio::test]
//! async fn rejects_bad_times_without_io() {
//!     let store = Arc::new(InMemoryFlightStore::new());
//!     let service = FlightService::builder(store.clone(), validator).build();
//!     // ...
//!     assert_eq!(store.create_calls(), 0);
//! }
//! ```

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

pub mod broker_mocks;
pub mod fixtures;
pub mod flight_mocks;

pub use broker_mocks::{MockBroker, ProduceBehavior};
pub use flight_mocks::{
    InMemoryFlightCache, InMemoryFlightStore, RecordingEventPublisher, StubAircraftValidator,
};

/// Install a test-friendly tracing subscriber.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}
