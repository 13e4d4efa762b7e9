//! Fuzz target: JSON deserialization of `AddParticipantBody`.
//!
//! Arbitrary request bodies must never panic the parser.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wichtel_gateway::routes::AddParticipantBody;

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<AddParticipantBody>(data);
});
