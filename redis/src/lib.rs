//! Redis flight cache for the flights service.
//!
//! Provides [`RedisFlightCache`], the production implementation of the
//! `FlightCache` trait from `flights-core`. The cache is never authoritative:
//! every error it returns is logged and swallowed by the service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod flight_cache;

pub use flight_cache::{DEFAULT_TTL, RedisFlightCache};
