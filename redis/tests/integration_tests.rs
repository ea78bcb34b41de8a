//! Integration tests for [`RedisFlightCache`] against a running Redis.
//!
//! Marked `#[ignore]`; point `REDIS_URL` at a disposable instance and run:
//!
//! ```bash
//! REDIS_URL=redis://127.0.0.1:6379 cargo test -p flights-redis -- --ignored
//! ```

#![allow(clippy::expect_used)]

use flights_core::cache::FlightCache;
use flights_core::flight::FlightId;
use flights_redis::RedisFlightCache;
use flights_testing::fixtures;
use std::time::Duration;
use uuid::Uuid;

async fn connect(ttl: Duration) -> RedisFlightCache {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    RedisFlightCache::new(&url, ttl)
        .await
        .expect("Failed to connect to Redis")
}

#[tokio::test]
#[ignore]
async fn stored_flight_is_returned_without_audit_fields() {
    let cache = connect(Duration::from_secs(60)).await;
    let mut flight = fixtures::stored_flight();
    flight.created_by = Some(Uuid::new_v4());

    cache.set_flight(&flight).await.expect("Failed to cache flight");
    let cached = cache
        .get_flight(flight.id)
        .await
        .expect("Failed to read cache")
        .expect("Flight should be cached");

    assert_eq!(cached.id, flight.id);
    assert_eq!(cached.number, flight.number);
    assert_eq!(cached.created_at, flight.created_at);
    assert_eq!(cached.created_by, None);
}

#[tokio::test]
#[ignore]
async fn unknown_flight_is_a_miss() {
    let cache = connect(Duration::from_secs(60)).await;

    let cached = cache
        .get_flight(FlightId::new())
        .await
        .expect("Failed to read cache");

    assert!(cached.is_none());
}

#[tokio::test]
#[ignore]
async fn entries_expire_after_ttl() {
    let cache = connect(Duration::from_secs(1)).await;
    let flight = fixtures::stored_flight();

    cache.set_flight(&flight).await.expect("Failed to cache flight");
    tokio::time::sleep(Duration::from_millis(2100)).await;

    let cached = cache
        .get_flight(flight.id)
        .await
        .expect("Failed to read cache");
    assert!(cached.is_none());
}
