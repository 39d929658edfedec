#![no_main]

use libfuzzer_sys::fuzz_target;

use cfxlink::Packet;

fuzz_target!(|data: &[u8]| {
    // arbitrary byte soup either decodes or errors, never panics
    let _ = Packet::from_bytes(data);
});
