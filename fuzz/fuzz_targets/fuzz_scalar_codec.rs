#![no_main]

use libfuzzer_sys::fuzz_target;

use cfxlink::{decode_scalar, encode_scalar};

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = decode_scalar(data) {
        // anything decodable from the wire re-encodes cleanly
        if value.is_finite() {
            let _ = encode_scalar(value, false);
        }
    }
});
