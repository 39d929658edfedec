#![no_main]

use libfuzzer_sys::fuzz_target;

use cfxlink::{len, PacketOps, Request};

fuzz_target!(|data: &[u8]| {
    if data.len() < len::REQUEST {return}

    let mut packet = Request::new();
    if let Err(_err) = packet.from_buf(data) {return}

    assert_eq!(packet.buf().len(), len::REQUEST);

    let _ = packet.category();
    let _ = packet.variable_name();
});
