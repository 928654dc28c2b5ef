//! Response validator: frame extraction, CRC/MBAP verification, device id
//! and function code matching, and Modbus exception surfacing (component
//! design §4.4).

use crate::constants::{MAX_MBAP_LENGTH, MBAP_HEADER_LEN};
use crate::error::{ModbusError, ModbusResult};
use crate::pdu::Framing;

/// Strip transport framing from a raw response, returning the PDU bytes
/// (device id, function, body) with CRC/MBAP header removed.
///
/// RTU: verify and strip the trailing CRC. TCP: verify the MBAP length
/// field against the actual frame length and strip the MBAP header.
pub fn extract_pdu(framing: Framing, raw: &[u8]) -> ModbusResult<Vec<u8>> {
    match framing {
        Framing::Rtu => {
            if raw.len() < 4 {
                return Err(ModbusError::UnexpectedReturn);
            }
            if !crate::crc::verify_trailing_crc(raw) {
                return Err(ModbusError::CrcMismatch);
            }
            Ok(raw[..raw.len() - 2].to_vec())
        }
        Framing::Tcp => {
            if raw.len() < MBAP_HEADER_LEN + 1 {
                return Err(ModbusError::UnexpectedReturn);
            }
            let length = u16::from_be_bytes([raw[4], raw[5]]) as usize;
            if length > MAX_MBAP_LENGTH || raw.len() - MBAP_HEADER_LEN != length {
                return Err(ModbusError::TcpLengthMismatch);
            }
            Ok(raw[MBAP_HEADER_LEN..].to_vec())
        }
    }
}

/// Outcome of validating a PDU against the outstanding request.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedResponse {
    /// `payload` excludes device id, function code, and (for reads) the
    /// byte-count field.
    Read { payload: Vec<u8> },
    /// The write echo matched; `register` is the single value written for
    /// functions 5/6.
    WriteAck,
}

/// Validate a response PDU against the device id / function code / echo the
/// request expects.
pub fn validate_pdu(
    pdu: &[u8],
    device_id: u8,
    func: u8,
    is_write: bool,
    expected_echo: Option<&[u8]>,
) -> ModbusResult<ValidatedResponse> {
    if pdu.len() < 2 {
        return Err(ModbusError::UnexpectedReturn);
    }

    let resp_dev = pdu[0];
    if resp_dev != device_id && resp_dev != 0 {
        return Err(ModbusError::UnexpectedDeviceId {
            expected: device_id,
            got: resp_dev,
        });
    }

    let resp_func = pdu[1];
    if resp_func == func {
        if is_write {
            if Some(pdu) != expected_echo {
                return Err(ModbusError::WriteEchoMismatch);
            }
            return Ok(ValidatedResponse::WriteAck);
        }
        let byte_count = *pdu.get(2).ok_or(ModbusError::MessageLengthMismatch)? as usize;
        let payload = &pdu[3..];
        if payload.len() != byte_count {
            return Err(ModbusError::MessageLengthMismatch);
        }
        return Ok(ValidatedResponse::Read {
            payload: payload.to_vec(),
        });
    }

    if resp_func == func.wrapping_add(0x80) || resp_func == 0x80 {
        let code = *pdu.get(2).ok_or(ModbusError::MessageLengthMismatch)?;
        return Err(exception_for_code(code));
    }

    Err(ModbusError::UnexpectedFunction {
        expected: func,
        got: resp_func,
    })
}

fn exception_for_code(code: u8) -> ModbusError {
    use crate::constants::*;
    let message = match code {
        c if c == EXCEPTION_ILLEGAL_FUNCTION => "illegal function",
        c if c == EXCEPTION_ILLEGAL_DATA_ADDRESS => "illegal data address",
        c if c == EXCEPTION_ILLEGAL_DATA_VALUE => "illegal data value",
        c if c == EXCEPTION_SERVER_DEVICE_FAILURE => "server device failure",
        c if c == EXCEPTION_ACKNOWLEDGE => "acknowledge",
        c if c == EXCEPTION_SERVER_DEVICE_BUSY => "server device busy",
        c if c == EXCEPTION_MEMORY_PARITY_ERROR => "memory parity error",
        c if c == EXCEPTION_GATEWAY_PATH_UNAVAILABLE => "gateway path unavailable",
        c if c == EXCEPTION_GATEWAY_TARGET_FAILED => "gateway target device failed to respond",
        1..=11 => "modbus exception",
        224..=228 => return ModbusError::GatewayPassthrough { code: code as u16 },
        _ => return ModbusError::UnknownRemoteCode { code: code as u16 },
    };
    ModbusError::RemoteException {
        code,
        message: message.to_string(),
    }
}
