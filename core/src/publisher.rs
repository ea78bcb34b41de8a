//! Publication of flight lifecycle events.
//!
//! From the orchestration service's point of view publishing is best-effort: any
//! [`PublishError`] is logged and swallowed once the flight is durably stored.

use crate::flight::Flight;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from [`FlightEventPublisher::publish_flight_created`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The event could not be encoded. Permanent.
    #[error("event serialization failed: {0}")]
    Serialization(String),

    /// The broker client did not accept the message in time
    #[error("broker did not accept message within {0:?} (producer buffer full)")]
    EnqueueTimeout(Duration),

    /// The broker client refused the message
    #[error("produce failed: {0}")]
    Produce(String),

    /// The caller cancelled the request
    #[error("publish cancelled")]
    Cancelled,

    /// The publisher has been shut down
    #[error("publisher closed")]
    Closed,
}

impl PublishError {
    /// Whether retrying the same event can never succeed.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "serialization_error",
            Self::EnqueueTimeout(_) => "produce_timeout",
            Self::Produce(_) => "produce_error",
            Self::Cancelled => "context_cancelled",
            Self::Closed => "publisher_closed",
        }
    }
}

/// Publishes "flight created" facts to the rest of the platform.
pub trait FlightEventPublisher: Send + Sync {
    /// Publish a `FlightCreated` event for a stored flight.
    ///
    /// Resolves once the broker client has *accepted* the message; delivery is
    /// confirmed out of band.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the event was not accepted.
    fn publish_flight_created<'a>(
        &'a self,
        flight: &'a Flight,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>>;
}

/// Publisher that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventPublisher;

impl FlightEventPublisher for NoopEventPublisher {
    fn publish_flight_created<'a>(
        &'a self,
        _flight: &'a Flight,
        _cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }
}
