//! CBOR encoding for events and requests.
//!
//! Delivery implementations that move bytes (channels, sockets) use these
//! helpers; everything above them stays typed. Encoding is deterministic
//! for a given value, so tests can compare encoded frames directly.

use bytes::Bytes;

use crate::{Event, Request};

/// Encoding or decoding failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProtocolError {
    /// CBOR serialization failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// CBOR deserialization failed (truncated, corrupt, or unknown tag).
    #[error("decode error: {0}")]
    Decode(String),
}

/// Encode an event to CBOR bytes.
pub fn encode_event(event: &Event) -> Result<Bytes, ProtocolError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(event, &mut buf)
        .map_err(|e| ProtocolError::Encode(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Decode an event from CBOR bytes.
pub fn decode_event(bytes: &[u8]) -> Result<Event, ProtocolError> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}

/// Encode a request to CBOR bytes.
pub fn encode_request(request: &Request) -> Result<Bytes, ProtocolError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(request, &mut buf)
        .map_err(|e| ProtocolError::Encode(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Decode a request from CBOR bytes.
pub fn decode_request(bytes: &[u8]) -> Result<Request, ProtocolError> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}
