//! Wire types for the game protocol.
//!
//! Typed request and event payloads with serde, plus a CBOR codec for
//! transports that move encoded bytes. Tags are snake_case and payload
//! fields camelCase, matching what game clients already speak. The server
//! core works with the typed values; only delivery implementations touch
//! the encoded form.
//!
//! We chose CBOR because it's self-describing (field names embedded),
//! compact, and doesn't need code generation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod events;
pub mod requests;

pub use codec::{ProtocolError, decode_event, decode_request, encode_event, encode_request};
pub use events::Event;
pub use requests::Request;
