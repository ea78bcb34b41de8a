//! Best-effort flight cache.
//!
//! The cache is never authoritative. Entries are disposable copies keyed by flight
//! id with a fixed expiry; losing one costs a store read, nothing more. Callers
//! log cache errors and carry on.

use crate::flight::{Flight, FlightId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors reported by a [`FlightCache`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Could not reach the cache server
    #[error("cache connection error: {0}")]
    Connection(String),

    /// The cache server rejected a command
    #[error("cache command error: {0}")]
    Command(String),

    /// A cached value could not be encoded or decoded
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Read-through / write-through acceleration for flight lookups.
///
/// `get_flight` returns `Ok(None)` on a miss.
pub trait FlightCache: Send + Sync {
    /// Look up a cached flight.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache cannot be read. A miss is not an error.
    fn get_flight(
        &self,
        id: FlightId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Flight>, CacheError>> + Send + '_>>;

    /// Store a flight, replacing any existing entry and resetting its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the entry cannot be written.
    fn set_flight<'a>(
        &'a self,
        flight: &'a Flight,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>>;
}

/// Cache that stores nothing. The default when no cache is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopFlightCache;

impl FlightCache for NoopFlightCache {
    fn get_flight(
        &self,
        _id: FlightId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Flight>, CacheError>> + Send + '_>> {
        Box::pin(async { Ok(None) })
    }

    fn set_flight<'a>(
        &'a self,
        _flight: &'a Flight,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_cache_always_misses() {
        let cache = NoopFlightCache;
        let result = cache.get_flight(FlightId::new()).await;
        assert_eq!(result, Ok(None));
    }
}
