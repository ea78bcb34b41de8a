//! Kafka/Redpanda event publishing for the flights service.
//!
//! This crate turns stored flights into `FlightCreated` messages on a
//! Kafka-compatible broker:
//!
//! - [`EventPublisher`]: the produce/confirm pipeline. Works over any
//!   [`BrokerClient`](flights_core::broker::BrokerClient).
//! - [`RdKafkaBroker`]: the production client, built on rdkafka.
//! - [`BincodeCodec`] and [`JsonCodec`]: wire encodings of the event.
//!
//! # Delivery Semantics
//!
//! Publishing is **at most once** from the request's point of view:
//! - `publish` resolves once the client has accepted the message into its buffer,
//!   bounded by a 2 second enqueue timeout
//! - Delivery confirmations arrive later and are observed only by the publisher's
//!   background drain task
//! - Messages are keyed by flight id, so a flight's events stay ordered within
//!   one partition
//!
//! Any compatible broker works: Redpanda, Apache Kafka, MSK, Event Hubs.
//!
//! # Example
//!
//! ```no_run
//! use flights_redpanda::{EventPublisher, JsonCodec, RdKafkaBroker};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let broker = RdKafkaBroker::builder()
//!     .brokers("localhost:9092")
//!     .acks("all")
//!     .build()?;
//!
//! let publisher = EventPublisher::builder(broker)
//!     .topic("flights")
//!     .codec(JsonCodec)
//!     .enqueue_timeout(Duration::from_secs(2))
//!     .start()?;
//!
//! publisher.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod producer;
pub mod publisher;

pub use codec::{BincodeCodec, JsonCodec};
pub use producer::{RdKafkaBroker, RdKafkaBrokerBuilder};
pub use publisher::{DrainSummary, EventPublisher, EventPublisherBuilder};
