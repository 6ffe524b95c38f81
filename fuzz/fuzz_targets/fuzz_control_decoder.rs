//! Fuzz target: `decode_control` (control-topic payloads)
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Payloads over budget never decode to a level
//! - A decoded level always came from a JSON boolean `state` field
//!
//! cargo fuzz run fuzz_control_decoder

#![no_main]

use edgenode::app::commands::decode_control;
use edgenode::config::JSON_BUFFER_BYTES;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let result = decode_control(data, JSON_BUFFER_BYTES);

    if data.len() > JSON_BUFFER_BYTES {
        assert!(result.desired().is_none(), "oversized payload decoded");
        return;
    }

    if let Some(level) = result.desired() {
        let value: serde_json::Value =
            serde_json::from_slice(data).expect("decoded payload must be JSON");
        assert_eq!(value["state"], level, "level must come from the state field");
    }
});
