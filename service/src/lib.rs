//! # Flights Service
//!
//! Orchestration for creating and looking up scheduled flights.
//!
//! A flight is created by validating the input, confirming the aircraft exists,
//! writing it durably, then caching it and publishing a `FlightCreated` event on
//! a best-effort basis. Lookups go cache first and backfill on a miss.
//!
//! ## Modules
//!
//! - [`service`]: the [`FlightService`] orchestration core
//! - [`aircraft`]: HTTP client for the aircraft service
//! - [`config`]: environment configuration
//! - [`metrics`]: Prometheus exporter
//! - [`server`]: axum transport

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aircraft;
pub mod config;
pub mod metrics;
pub mod server;
pub mod service;

pub use aircraft::HttpAircraftValidator;
pub use config::{Config, ConfigError};
pub use service::{FlightService, FlightServiceBuilder, NewFlight};
