#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mbpoll::pdu::{build_request, expected_response_length, Framing};

#[derive(Arbitrary, Debug)]
struct Input {
    rtu: bool,
    device_id: u8,
    func: u8,
    start_reg: u16,
    arg: u16,
}

fuzz_target!(|input: Input| {
    let framing = if input.rtu { Framing::Rtu } else { Framing::Tcp };
    if let Ok(packet) = build_request(framing, input.device_id, input.func, input.start_reg, input.arg) {
        // A request frame must always be parseable back through its own framing.
        let raw = packet.bytes;
        match framing {
            Framing::Rtu => assert!(mbpoll::crc::verify_trailing_crc(&raw)),
            Framing::Tcp => {
                let len = u16::from_be_bytes([raw[4], raw[5]]) as usize;
                assert_eq!(raw.len() - 6, len);
            }
        }
    }
    let _ = expected_response_length(input.func, input.arg as usize);
});
