//! Request builder: constructs RTU/TCP request frames and the expected
//! "echo" PDU for write commands, per the framing rules in the component
//! design.

use crate::constants::{FC_WRITE_MULTIPLE_REGISTERS, FC_WRITE_SINGLE_COIL, MBAP_HEADER_LEN};
use crate::crc::append_crc;
use crate::error::{ModbusError, ModbusResult};
use tracing::debug;

/// The fixed vendor-specific payload function code 16 emits in the source,
/// preserved verbatim per design-note decision #1: `(59492, 3, 8, 47368)`.
/// The `value_to_write` argument the caller supplies is ignored when this
/// path is used.
pub const FC16_VENDOR_FIXED_PAYLOAD: [u16; 4] = [59492, 3, 8, 47368];

/// Which wire framing a request packet should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Rtu,
    Tcp,
}

/// A constructed request, plus (for write commands) the PDU bytes the
/// response must echo back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPacket {
    pub bytes: Vec<u8>,
    pub expected_echo: Option<Vec<u8>>,
}

/// Build the PDU body (function + address + argument), shared between RTU
/// and TCP framing — only the envelope differs.
fn build_pdu_body(func: u8, start_reg: u16, arg: u16) -> ModbusResult<Vec<u8>> {
    let mut body = vec![func, (start_reg >> 8) as u8, (start_reg & 0xFF) as u8];
    if func == FC_WRITE_SINGLE_COIL {
        match arg {
            1 => body.extend_from_slice(&[0xFF, 0x00]),
            0 => body.extend_from_slice(&[0x00, 0x00]),
            other => {
                return Err(ModbusError::InvalidValue {
                    message: format!("coil write value must be 0 or 1, got {other}"),
                })
            }
        }
    } else {
        body.extend_from_slice(&[(arg >> 8) as u8, (arg & 0xFF) as u8]);
    }
    Ok(body)
}

/// Build a request frame for any function except 16.
///
/// `arg` is the register/coil count for reads, or the value to write for
/// functions 5/6.
pub fn build_request(
    framing: Framing,
    device_id: u8,
    func: u8,
    start_reg: u16,
    arg: u16,
) -> ModbusResult<RequestPacket> {
    let body = build_pdu_body(func, start_reg, arg)?;
    let mut pdu = vec![device_id];
    pdu.extend_from_slice(&body);

    let packet = match framing {
        Framing::Rtu => {
            let mut frame = pdu.clone();
            append_crc(&mut frame);
            debug!(?frame, "built RTU request frame");
            frame
        }
        Framing::Tcp => {
            let len = pdu.len() as u16; // unit id + PDU; the length field itself is not counted
            let mut frame = vec![0u8; MBAP_HEADER_LEN];
            frame[4] = (len >> 8) as u8;
            frame[5] = (len & 0xFF) as u8;
            frame.extend_from_slice(&pdu);
            debug!(?frame, "built TCP request frame");
            frame
        }
    };

    let is_write = matches!(func, 5 | 6);
    let expected_echo = if is_write { Some(pdu) } else { None };

    Ok(RequestPacket {
        bytes: packet,
        expected_echo,
    })
}

/// Build a write-multiple-registers (function 16) request from a
/// user-supplied array of register values — the "proper" API called for by
/// design-note decision #1.
pub fn build_fc16_pdu(
    framing: Framing,
    device_id: u8,
    start_reg: u16,
    values: &[u16],
) -> RequestPacket {
    build_fc16_from_registers(framing, device_id, start_reg, values)
}

/// Build the function-16 request using the source's hard-coded vendor setup
/// payload, ignoring any caller-supplied value. Reproduced verbatim per
/// design-note decision #1 and kept separate from [`build_fc16_pdu`] so
/// callers must opt into the historical behavior explicitly.
pub fn build_fc16_fixed_pdu(framing: Framing, device_id: u8, start_reg: u16) -> RequestPacket {
    build_fc16_from_registers(framing, device_id, start_reg, &FC16_VENDOR_FIXED_PAYLOAD)
}

fn build_fc16_from_registers(
    framing: Framing,
    device_id: u8,
    start_reg: u16,
    values: &[u16],
) -> RequestPacket {
    let count = values.len() as u16;
    let byte_count = (values.len() * 2) as u8;

    let mut pdu = vec![
        device_id,
        FC_WRITE_MULTIPLE_REGISTERS,
        (start_reg >> 8) as u8,
        (start_reg & 0xFF) as u8,
        (count >> 8) as u8,
        (count & 0xFF) as u8,
        byte_count,
    ];
    for &v in values {
        pdu.extend_from_slice(&[(v >> 8) as u8, (v & 0xFF) as u8]);
    }

    let bytes = match framing {
        Framing::Rtu => {
            let mut frame = pdu.clone();
            append_crc(&mut frame);
            frame
        }
        Framing::Tcp => {
            let len = pdu.len() as u16; // unit id + PDU; the length field itself is not counted
            let mut frame = vec![0u8; MBAP_HEADER_LEN];
            frame[4] = (len >> 8) as u8;
            frame[5] = (len & 0xFF) as u8;
            frame.extend_from_slice(&pdu);
            frame
        }
    };

    // The echo for FC16 is the first 6 bytes after the device id (device,
    // func, addr_hi, addr_lo, count_hi, count_lo) — the server does not
    // echo the written values back.
    let expected_echo = Some(pdu[..7.min(pdu.len())].to_vec());

    RequestPacket { bytes, expected_echo }
}

/// Expected response length in bytes, per the component design's table:
/// RTU reads are `5 + ceil(num_regs/8)` for coil/discrete-input functions,
/// else `5 + 2*num_regs`; writes are always `8`.
pub fn expected_response_length(func: u8, num_regs: usize) -> usize {
    match func {
        1 | 2 => 5 + num_regs.div_ceil(8),
        5 | 6 | 16 => 8,
        _ => 5 + 2 * num_regs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_holding_rtu_frame() {
        let packet = build_request(Framing::Rtu, 1, 3, 0, 1).unwrap();
        assert_eq!(packet.bytes, vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A]);
        assert!(packet.expected_echo.is_none());
    }

    #[test]
    fn write_single_coil_on_encodes_ff00() {
        let packet = build_request(Framing::Rtu, 1, 5, 10, 1).unwrap();
        assert_eq!(packet.bytes[4..6], [0xFF, 0x00]);
    }

    #[test]
    fn write_single_coil_rejects_non_bool_value() {
        let err = build_request(Framing::Rtu, 1, 5, 10, 2).unwrap_err();
        assert_eq!(err.code(), 3);
    }

    #[test]
    fn write_single_register_echo_matches_pdu() {
        let packet = build_request(Framing::Rtu, 1, 6, 0, 42).unwrap();
        let echo = packet.expected_echo.unwrap();
        assert_eq!(echo, vec![0x01, 0x06, 0x00, 0x00, 0x00, 42]);
    }

    #[test]
    fn tcp_frame_length_field_excludes_mbap_header() {
        let packet = build_request(Framing::Tcp, 1, 3, 0, 1).unwrap();
        // frame = [0,0,0,0,len_hi,len_lo, pdu...]
        let len = u16::from_be_bytes([packet.bytes[4], packet.bytes[5]]) as usize;
        assert_eq!(len, packet.bytes.len() - 6);
    }

    #[test]
    fn fc16_fixed_payload_matches_vendor_setup() {
        let packet = build_fc16_fixed_pdu(Framing::Rtu, 1, 100);
        // function, addr_hi, addr_lo, count_hi, count_lo, byte_count, then 4 regs
        assert_eq!(packet.bytes[1], FC_WRITE_MULTIPLE_REGISTERS);
        assert_eq!(packet.bytes[6], 8); // byte_count = 4 regs * 2
    }

    #[test]
    fn expected_response_length_matches_table() {
        assert_eq!(expected_response_length(1, 10), 5 + 2);
        assert_eq!(expected_response_length(3, 1), 7);
        assert_eq!(expected_response_length(6, 0), 8);
    }
}
