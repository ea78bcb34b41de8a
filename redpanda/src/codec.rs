//! Event codecs.
//!
//! [`BincodeCodec`] frames every payload the way schema-registry aware consumers
//! expect:
//!
//! ```text
//! ┌───────┬────────────────────┬─────────────────┐
//! │ 0x00  │ schema id (u32 BE) │ bincode payload │
//! └───────┴────────────────────┴─────────────────┘
//!  1 byte        4 bytes
//! ```
//!
//! The schema id changes whenever the encoding of [`FlightCreated`] changes, so
//! old and new payloads can share a topic.

use flights_core::codec::{CodecError, EventCodec};
use flights_core::event::{FlightCreated, SCHEMA_VERSION};

/// First byte of every framed payload.
pub const MAGIC_BYTE: u8 = 0x00;

const HEADER_LEN: usize = 5;

/// Framed bincode codec. The default for production topics.
#[derive(Clone, Copy, Debug)]
pub struct BincodeCodec {
    schema_id: u32,
}

impl BincodeCodec {
    /// Codec for the current [`FlightCreated`] schema
    #[must_use]
    pub const fn new() -> Self {
        Self {
            schema_id: SCHEMA_VERSION,
        }
    }

    /// Codec writing and accepting an explicit registry schema id
    #[must_use]
    pub const fn with_schema_id(schema_id: u32) -> Self {
        Self { schema_id }
    }

    /// Schema id written into every frame
    #[must_use]
    pub const fn schema_id(&self) -> u32 {
        self.schema_id
    }
}

impl Default for BincodeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl EventCodec for BincodeCodec {
    fn content_type(&self) -> &'static str {
        "application/vnd.flights.bincode"
    }

    fn encode(&self, event: &FlightCreated) -> Result<Vec<u8>, CodecError> {
        let body = bincode::serialize(event).map_err(|e| CodecError::Encode(e.to_string()))?;

        let mut framed = Vec::with_capacity(HEADER_LEN + body.len());
        framed.push(MAGIC_BYTE);
        framed.extend_from_slice(&self.schema_id.to_be_bytes());
        framed.extend_from_slice(&body);
        Ok(framed)
    }

    fn decode(&self, bytes: &[u8]) -> Result<FlightCreated, CodecError> {
        let Some((header, body)) = bytes.split_first_chunk::<HEADER_LEN>() else {
            return Err(CodecError::Decode(format!(
                "frame too short: {} bytes",
                bytes.len()
            )));
        };

        if header[0] != MAGIC_BYTE {
            return Err(CodecError::Decode(format!(
                "unknown magic byte {:#04x}",
                header[0]
            )));
        }

        let schema_id = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
        if schema_id != self.schema_id {
            return Err(CodecError::UnsupportedVersion(schema_id));
        }

        bincode::deserialize(body).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Plain JSON codec, handy for topics humans read.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl EventCodec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, event: &FlightCreated) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(event).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<FlightCreated, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
