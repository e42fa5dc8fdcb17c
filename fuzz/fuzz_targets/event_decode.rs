//! Fuzz target for the CBOR wire codec
//!
//! Feeds arbitrary bytes to `decode_event` and `decode_request` to find:
//! - Parser crashes or panics
//! - Tag confusion between the two message families
//! - Values that decode but cannot be re-encoded
//!
//! The decoders should NEVER panic. Invalid inputs must return an error,
//! and anything that decodes must survive a re-encode round trip.

#![no_main]

use chaupar_proto::{decode_event, decode_request, encode_event, encode_request};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Attempt to decode arbitrary bytes as an event.
    // This should never panic, only return Err for invalid data.
    if let Ok(event) = decode_event(data) {
        let bytes = encode_event(&event).expect("decoded event must re-encode");
        let again = decode_event(&bytes).expect("re-encoded event must decode");
        assert_eq!(event, again);
    }

    // Same bytes as a request; the tagged enums must not cross-decode into
    // nonsense that breaks encoding.
    if let Ok(request) = decode_request(data) {
        let bytes = encode_request(&request).expect("decoded request must re-encode");
        let again = decode_request(&bytes).expect("re-encoded request must decode");
        assert_eq!(request, again);
    }
});
