//! # Flights Core
//!
//! Domain types, validation rules and collaborator traits for the flights service.
//!
//! This crate has no I/O of its own. It defines:
//!
//! - **Domain**: [`flight::Flight`], [`flight::FlightStatus`] and strongly typed identifiers
//! - **Validation**: pure normalisation of flight numbers, IATA codes and schedules
//! - **Errors**: the taxonomy returned to transport adapters ([`error::FlightError`])
//! - **Collaborators**: [`store::FlightStore`], [`cache::FlightCache`],
//!   [`aircraft::ExistenceValidator`], [`broker::BrokerClient`], [`codec::EventCodec`]
//!   and [`publisher::FlightEventPublisher`]
//! - **Events**: the versioned [`event::FlightCreated`] payload
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  Transport   │  (HTTP / gRPC adapters)
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐     ┌────────────────────┐
//! │ FlightService│────►│ ExistenceValidator │  fatal on failure
//! └──────┬───────┘     └────────────────────┘
//!        │
//!        ├──────────►  FlightStore            source of truth, fatal on failure
//!        ├──────────►  FlightCache            best-effort
//!        └──────────►  FlightEventPublisher   best-effort
//! ```
//!
//! Production adapters live in `flights-postgres`, `flights-redis` and
//! `flights-redpanda`; in-memory fakes live in `flights-testing`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aircraft;
pub mod broker;
pub mod cache;
pub mod codec;
pub mod context;
pub mod error;
pub mod event;
pub mod flight;
pub mod publisher;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use tokio_util::sync::CancellationToken;

pub use error::{ErrorKind, FlightError, ValidationError};
pub use flight::{AircraftId, Flight, FlightId, FlightStatus};
