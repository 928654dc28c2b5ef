#![no_main]
use libfuzzer_sys::fuzz_target;
use mbpoll::pdu::Framing;
use mbpoll::response::{extract_pdu, validate_pdu};

fuzz_target!(|data: &[u8]| {
    if let Ok(pdu) = extract_pdu(Framing::Tcp, data) {
        let _ = validate_pdu(&pdu, 1, 3, false, None);
    }
    if let Ok(pdu) = extract_pdu(Framing::Rtu, data) {
        let _ = validate_pdu(&pdu, 1, 3, false, None);
    }
});
