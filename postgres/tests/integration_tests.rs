//! Integration tests for `PostgresFlightStore` using testcontainers.
//!
//! # Requirements
//!
//! Docker must be running. The tests start a `PostgreSQL` container, apply the
//! embedded migrations and exercise the store. They are `#[ignore]` by default:
//!
//! ```bash
//! cargo test -p flights-postgres --test integration_tests -- --ignored
//! ```

#![allow(clippy::expect_used)] // Test code uses expect for clear failure messages

use flights_core::flight::{FlightId, FlightStatus};
use flights_core::store::{FlightStore, StoreError};
use flights_postgres::PostgresFlightStore;
use flights_testing::fixtures;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// Start a Postgres container and return a migrated store.
///
/// Returns both the container (to keep it alive) and the store.
async fn setup_store() -> (ContainerAsync<Postgres>, PostgresFlightStore) {
    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start postgres container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");
    let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

    let pool = sqlx::PgPool::connect(&url)
        .await
        .expect("Failed to connect to postgres");
    let store = PostgresFlightStore::new(pool);
    store.migrate().await.expect("Failed to run migrations");

    (container, store)
}

#[tokio::test]
#[ignore]
async fn insert_returns_timestamps_and_round_trips() {
    let (_container, store) = setup_store().await;
    let mut flight = fixtures::flight();
    flight.created_by = Some(Uuid::new_v4());

    let stamps = store
        .create_flight(&flight)
        .await
        .expect("Failed to create flight");
    let loaded = store
        .get_flight_by_id(flight.id)
        .await
        .expect("Failed to load flight");

    assert_eq!(loaded.id, flight.id);
    assert_eq!(loaded.number, "AA123");
    assert_eq!(loaded.origin, "LAX");
    assert_eq!(loaded.destination, "JFK");
    assert_eq!(loaded.departure_time, flight.departure_time);
    assert_eq!(loaded.status, FlightStatus::Scheduled);
    assert_eq!(loaded.aircraft_id, flight.aircraft_id);
    assert_eq!(loaded.created_by, flight.created_by);
    assert_eq!(loaded.created_at, Some(stamps.created_at));
    assert_eq!(loaded.updated_at, Some(stamps.updated_at));
}

#[tokio::test]
#[ignore]
async fn same_number_and_departure_is_a_duplicate() {
    let (_container, store) = setup_store().await;
    let first = fixtures::flight();
    let second = fixtures::flight();

    store
        .create_flight(&first)
        .await
        .expect("Failed to create first flight");
    let err = store
        .create_flight(&second)
        .await
        .expect_err("Second insert should conflict");

    assert_eq!(
        err,
        StoreError::Duplicate {
            number: second.number.clone(),
            departure: second.departure_time,
        }
    );
}

#[tokio::test]
#[ignore]
async fn other_constraint_violations_are_database_errors() {
    let (_container, store) = setup_store().await;
    let mut flight = fixtures::flight();
    flight.arrival_time = flight.departure_time;

    let err = store
        .create_flight(&flight)
        .await
        .expect_err("Check constraint should reject the insert");

    assert!(matches!(err, StoreError::Database { flight_id, .. } if flight_id == flight.id));
}

#[tokio::test]
#[ignore]
async fn missing_flight_is_not_found() {
    let (_container, store) = setup_store().await;
    let id = FlightId::new();

    let err = store
        .get_flight_by_id(id)
        .await
        .expect_err("Nothing was inserted");

    assert_eq!(err, StoreError::NotFound(id));
}
