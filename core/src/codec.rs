//! Pluggable wire encoding for flight events.

use crate::event::FlightCreated;
use thiserror::Error;

/// Errors from encoding or decoding an event.
///
/// Encoding failures are permanent: retrying the same payload cannot succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The event could not be encoded
    #[error("failed to encode event: {0}")]
    Encode(String),

    /// The bytes could not be decoded
    #[error("failed to decode event: {0}")]
    Decode(String),

    /// The bytes were written with a schema this codec does not know
    #[error("unsupported schema version {0}")]
    UnsupportedVersion(u32),
}

/// Serializes [`FlightCreated`] events for the broker.
///
/// Implementations must be versioned or self-describing so the schema can evolve.
pub trait EventCodec: Send + Sync {
    /// Short name, used as the `contentType` header and in logs.
    fn content_type(&self) -> &'static str;

    /// Encode an event.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the event cannot be serialized.
    fn encode(&self, event: &FlightCreated) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes produced by [`EventCodec::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] or [`CodecError::UnsupportedVersion`].
    fn decode(&self, bytes: &[u8]) -> Result<FlightCreated, CodecError>;
}
