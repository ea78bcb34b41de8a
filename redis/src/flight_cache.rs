//! Redis-based flight cache.
//!
//! # Architecture
//!
//! Flights are stored with:
//! - **Key**: `flight:{flight_id}` → JSON-serialized `Flight`
//! - **TTL**: fixed per cache instance, 15 minutes by default
//!
//! Audit fields are not part of the JSON form, so cached copies never carry them.
//!
//! # Example
//!
//! ```no_run
//! use flights_redis::RedisFlightCache;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RedisFlightCache::new("redis://127.0.0.1:6379", Duration::from_secs(900)).await?;
//! # Ok(())
//! # }
//! ```

use flights_core::cache::{CacheError, FlightCache};
use flights_core::flight::{Flight, FlightId};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Flight cache over a Redis `ConnectionManager`.
///
/// Clones share the same connection manager.
#[derive(Clone)]
pub struct RedisFlightCache {
    conn_manager: ConnectionManager,
    ttl: Duration,
}

impl RedisFlightCache {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is malformed or the server
    /// cannot be reached.
    pub async fn new(redis_url: &str, ttl: Duration) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("invalid Redis URL: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Connection(format!("failed to create Redis connection manager: {e}"))
        })?;

        tracing::info!(ttl_seconds = ttl.as_secs(), "Redis flight cache connected");

        Ok(Self::from_manager(conn_manager, ttl))
    }

    /// Wrap an existing connection manager.
    #[must_use]
    pub const fn from_manager(conn_manager: ConnectionManager, ttl: Duration) -> Self {
        Self { conn_manager, ttl }
    }

    /// Entry lifetime
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Redis key for a flight.
    #[must_use]
    pub fn key_for(id: FlightId) -> String {
        format!("flight:{id}")
    }

    /// Round-trip a `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the server does not answer.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| classify(&e))?;
        Ok(())
    }

    async fn get(&self, id: FlightId) -> Result<Option<Flight>, CacheError> {
        let mut conn = self.conn_manager.clone();
        let key = Self::key_for(id);

        let value: Option<String> = conn.get(&key).await.map_err(|e| {
            record("get", "error");
            classify(&e)
        })?;

        let Some(value) = value else {
            record("get", "miss");
            tracing::debug!(flight_id = %id, "Flight cache miss");
            return Ok(None);
        };

        let flight = serde_json::from_str(&value).map_err(|e| {
            record("get", "decode_error");
            CacheError::Serialization(e.to_string())
        })?;

        record("get", "hit");
        tracing::debug!(flight_id = %id, "Flight cache hit");
        Ok(Some(flight))
    }

    async fn set(&self, flight: &Flight) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        let key = Self::key_for(flight.id);

        let value = serde_json::to_string(flight).map_err(|e| {
            record("set", "encode_error");
            CacheError::Serialization(e.to_string())
        })?;

        let _: () = conn
            .set_ex(&key, value, self.ttl.as_secs().max(1))
            .await
            .map_err(|e| {
                record("set", "error");
                classify(&e)
            })?;

        record("set", "success");
        Ok(())
    }
}

impl FlightCache for RedisFlightCache {
    fn get_flight(
        &self,
        id: FlightId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Flight>, CacheError>> + Send + '_>> {
        Box::pin(self.get(id))
    }

    fn set_flight<'a>(
        &'a self,
        flight: &'a Flight,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>> {
        Box::pin(self.set(flight))
    }
}

/// Split transport failures from command failures.
fn classify(error: &RedisError) -> CacheError {
    if error.is_io_error()
        || error.is_connection_refusal()
        || error.is_connection_dropped()
        || error.is_timeout()
    {
        CacheError::Connection(error.to_string())
    } else {
        CacheError::Command(error.to_string())
    }
}

fn record(operation: &'static str, result: &'static str) {
    metrics::counter!(
        "flights_cache_operations_total",
        "operation" => operation,
        "result" => result
    )
    .increment(1);
}
