//! Client-side abstraction over a message broker producer.
//!
//! A [`BrokerClient`] accepts messages into its own send buffer and reports the
//! outcome of each delivery later, on a separate channel. The split lets the
//! request path return as soon as a message is *accepted* while a background task
//! observes whether it was *delivered*.
//!
//! ```text
//!  produce() ──► [ client buffer ] ──► broker
//!                                        │
//!  DeliveryReports ◄─────────────────────┘  (Delivered / Failed / ProducerError)
//! ```

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors returned synchronously by a [`BrokerClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The client's send buffer stayed full
    #[error("producer queue full")]
    QueueFull,

    /// The client refused the message
    #[error("produce failed: {0}")]
    Produce(String),

    /// Buffered messages were not delivered before the flush deadline
    #[error("flush failed: {0}")]
    Flush(String),

    /// The client was already closed
    #[error("broker client closed")]
    Closed,

    /// The client could not be created
    #[error("invalid broker configuration: {0}")]
    Configuration(String),
}

/// A message ready to hand to the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination topic
    pub topic: String,
    /// Partition key; messages with the same key keep their relative order
    pub key: String,
    /// Encoded event
    pub payload: Vec<u8>,
    /// Metadata headers (event type, schema version, trace context)
    pub headers: Vec<(String, String)>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    /// Look up a header value by key.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// How severe a producer-level error is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProducerErrorClass {
    /// The client is unusable and must be recreated
    Fatal,
    /// Transient; the client retries internally
    Retriable,
    /// Local or informational; nothing to do
    NonFatal,
}

impl ProducerErrorClass {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Retriable => "retriable",
            Self::NonFatal => "non_fatal",
        }
    }
}

/// An asynchronous outcome reported by the broker client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryReport {
    /// The broker acknowledged a message
    Delivered {
        /// Topic written to
        topic: String,
        /// Partition written to
        partition: i32,
        /// Offset assigned by the broker
        offset: i64,
        /// Message key
        key: Option<String>,
    },

    /// The broker rejected one specific message
    Failed {
        /// Topic of the rejected message
        topic: String,
        /// Partition of the rejected message, if assigned
        partition: i32,
        /// Message key
        key: Option<String>,
        /// Broker error
        error: String,
    },

    /// An error not tied to any one message
    ProducerError {
        /// Severity
        class: ProducerErrorClass,
        /// Error description
        error: String,
    },
}

/// Receiving end of a client's delivery reports.
///
/// The channel closes when the client is closed.
pub type DeliveryReports = mpsc::UnboundedReceiver<DeliveryReport>;

/// A thread-safe, non-async broker producer.
///
/// `produce` may block the calling thread (for example while the send buffer is
/// full), so callers run it on a blocking thread and bound the wait themselves.
pub trait BrokerClient: Send + Sync + 'static {
    /// Hand a message to the client's send buffer.
    ///
    /// Returning `Ok(())` means *accepted*, not *delivered*.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] if the message was not accepted.
    fn produce(&self, message: OutboundMessage) -> Result<(), BrokerError>;

    /// Take the delivery report stream.
    ///
    /// Returns `Some` exactly once; the caller becomes the sole reader. Later calls
    /// return `None`.
    fn take_delivery_reports(&self) -> Option<DeliveryReports>;

    /// Block until buffered messages are delivered or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Flush`] if messages remain after the deadline.
    fn flush(&self, timeout: Duration) -> Result<(), BrokerError>;

    /// Release the client. The delivery report channel closes once this returns.
    fn close(&self);
}
