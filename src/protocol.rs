//! Validated request construction: the bounds-checking validators of
//! component design §4.2 and the immutable [`PollRequest`] they produce.
//!
//! The public constructor ([`PollRequest::build`]) always runs every
//! validator below before yielding a request — mirroring the source's
//! CLI entry point. [`PollRequest::from_validated`] skips re-validation for
//! embedders that already normalized their inputs once (the reimplemented
//! equivalent of the source's `B_CMD_LINE` distinction, see the design
//! notes).

use crate::constants::*;
use crate::error::{ModbusError, ModbusResult};
use crate::value::DataType;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Transport target: either a TCP host/port or a serial port name.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Tcp { host: Ipv4Addr, port: u16 },
    Serial { name: String, baud: u32 },
}

/// Device id, in [1, 255].
pub fn validate_device_id(raw: u32) -> ModbusResult<u8> {
    if (MIN_DEVICE_ID as u32..=MAX_DEVICE_ID as u32).contains(&raw) {
        Ok(raw as u8)
    } else {
        Err(ModbusError::InvalidDeviceId { id: raw as u16 })
    }
}

/// Starting register address, in [0, 99990].
pub fn validate_start_register(raw: u32) -> ModbusResult<u32> {
    if (MIN_START_REGISTER..=MAX_START_REGISTER).contains(&raw) {
        Ok(raw)
    } else {
        Err(ModbusError::InvalidAddress {
            message: format!("starting register {raw} out of range [0, 99990]"),
        })
    }
}

/// Value count for reads, or register count, in [1, 99990].
pub fn validate_num_vals(raw: u32) -> ModbusResult<u32> {
    if (MIN_NUM_VALS..=MAX_NUM_VALS).contains(&raw) {
        Ok(raw)
    } else {
        Err(ModbusError::InvalidAddress {
            message: format!("value count {raw} out of range [1, 99990]"),
        })
    }
}

/// Per-function ceiling on a single PDU's register/coil count, so a poll
/// request never asks for more than one read or write can carry.
fn max_vals_for_function(function: u8) -> Option<u32> {
    match function {
        FC_READ_COILS | FC_READ_DISCRETE_INPUTS => Some(MAX_READ_COILS as u32),
        FC_READ_HOLDING_REGISTERS | FC_READ_INPUT_REGISTERS => Some(MAX_READ_REGISTERS as u32),
        FC_WRITE_MULTIPLE_REGISTERS => Some(MAX_WRITE_REGISTERS as u32),
        _ => None,
    }
}

/// Value count against the per-function PDU ceiling, in addition to the
/// generic [1, 99990] range [`validate_num_vals`] already enforces.
pub fn validate_num_vals_for_function(function: u8, num_vals: u32) -> ModbusResult<u32> {
    if let Some(max) = max_vals_for_function(function) {
        if num_vals > max {
            return Err(ModbusError::InvalidAddress {
                message: format!("function {function} cannot carry {num_vals} values (max {max})"),
            });
        }
    }
    Ok(num_vals)
}

/// Single-register write value, must fit in 16 bits.
pub fn validate_write_value(raw: u32) -> ModbusResult<u16> {
    if raw == (raw & 0xFFFF) {
        Ok(raw as u16)
    } else {
        Err(ModbusError::InvalidValue {
            message: format!("write value {raw} does not fit in 16 bits"),
        })
    }
}

/// Timeout in milliseconds, in [1, 10000].
pub fn validate_timeout_ms(raw: u32) -> ModbusResult<u32> {
    if (MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&raw) {
        Ok(raw)
    } else {
        Err(ModbusError::InvalidValue {
            message: format!("timeout {raw}ms out of range [1, 10000]"),
        })
    }
}

/// Function code, must be one of the seven the engine supports.
pub fn validate_function_code(raw: u8) -> ModbusResult<u8> {
    if SUPPORTED_FUNCTION_CODES.contains(&raw) {
        Ok(raw)
    } else {
        Err(ModbusError::InvalidFunction { code: raw as u16 })
    }
}

/// Data-type token, must be one of the named set.
pub fn validate_data_type(raw: &str) -> ModbusResult<DataType> {
    DataType::from_str(raw).map_err(|_| ModbusError::InvalidDataType {
        token: raw.to_string(),
    })
}

/// GPIO direction pin, either absent or one of the 24-pin allow-list.
pub fn validate_gpio_pin(raw: Option<&str>) -> ModbusResult<Option<String>> {
    match raw {
        None => Ok(None),
        Some(pin) if GPIO_BOARD_PINS.contains(&pin) => Ok(Some(pin.to_string())),
        Some(pin) => Err(ModbusError::InvalidGpioPin { pin: pin.to_string() }),
    }
}

/// Classify a target spec as a TCP host or a serial port name.
///
/// An IPv4 dotted-quad is always treated as TCP. Anything else is treated
/// as a serial port: a `COMn` token on Windows is checked syntactically
/// (actual enumeration is the transport layer's job — see the design
/// notes), while on POSIX any non-empty string is accepted as a device
/// path.
pub fn validate_target_spec(raw: &str, port: u16) -> ModbusResult<Target> {
    if let Ok(ip) = raw.parse::<Ipv4Addr>() {
        return Ok(Target::Tcp { host: ip, port });
    }

    if cfg!(windows) {
        let is_com_port = raw.len() > 3
            && raw[..3].eq_ignore_ascii_case("COM")
            && raw[3..].chars().all(|c| c.is_ascii_digit())
            && !raw[3..].is_empty();
        if is_com_port {
            return Ok(Target::Serial {
                name: raw.to_string(),
                baud: 9600,
            });
        }
        return Err(ModbusError::InvalidTargetSpec { spec: raw.to_string() });
    }

    if raw.is_empty() {
        return Err(ModbusError::InvalidTargetSpec { spec: raw.to_string() });
    }
    Ok(Target::Serial {
        name: raw.to_string(),
        baud: 9600,
    })
}

/// Immutable, fully-validated poll request.
#[derive(Debug, Clone, PartialEq)]
pub struct PollRequest {
    pub target: Target,
    pub device_id: u8,
    pub function: u8,
    pub start_register: u32,
    pub effective_start: u32,
    pub num_vals: u32,
    pub write_value: Option<u16>,
    pub data_type: DataType,
    pub byte_swap: bool,
    pub word_swap: bool,
    pub zero_based: bool,
    pub raw_bytes: bool,
    pub timeout_ms: u32,
    /// `None` means "poll forever" (the source's `poll_count == 0` sentinel,
    /// already translated — see [`crate::engine`]).
    pub poll_count: Option<u32>,
    pub poll_delay_ms: u32,
    pub csv_path: Option<String>,
    pub gpio_pin: Option<String>,
}

/// Raw, unvalidated fields a caller wants turned into a [`PollRequest`].
#[derive(Debug, Clone)]
pub struct RawPollRequest {
    pub target_spec: String,
    pub tcp_port: u16,
    pub device_id: u32,
    pub function: u8,
    pub start_register: u32,
    pub num_vals: u32,
    pub write_value: Option<u32>,
    pub data_type: String,
    pub byte_swap: bool,
    pub word_swap: bool,
    pub zero_based: bool,
    pub raw_bytes: bool,
    pub timeout_ms: u32,
    pub poll_count: u32,
    pub poll_delay_ms: u32,
    pub csv_path: Option<String>,
    pub gpio_pin: Option<String>,
}

impl PollRequest {
    /// Validate every field and produce a [`PollRequest`], or the first
    /// validation failure encountered (short-circuiting, matching the
    /// source's validation order).
    pub fn build(raw: RawPollRequest) -> ModbusResult<PollRequest> {
        let function = validate_function_code(raw.function)?;
        let target = validate_target_spec(&raw.target_spec, raw.tcp_port)?;
        let device_id = validate_device_id(raw.device_id)?;
        let start_register = validate_start_register(raw.start_register)?;
        let num_vals = validate_num_vals(raw.num_vals)?;
        let num_vals = validate_num_vals_for_function(function, num_vals)?;
        let timeout_ms = validate_timeout_ms(raw.timeout_ms)?;
        let data_type = validate_data_type(&raw.data_type)?;
        let gpio_pin = validate_gpio_pin(raw.gpio_pin.as_deref())?;

        let is_write = matches!(function, 5 | 6 | 16);
        if is_write && raw.poll_count != 1 {
            return Err(ModbusError::MultiPollWithWrite);
        }

        let write_value = match raw.write_value {
            Some(v) => Some(validate_write_value(v)?),
            None => None,
        };

        let effective_start = if raw.zero_based {
            start_register
        } else {
            start_register
                .checked_sub(1)
                .ok_or(ModbusError::InvalidRegisterLookup)?
        };

        let (poll_count, poll_delay_ms) = if raw.poll_count == 0 {
            (None, if is_write { 0 } else { raw.poll_delay_ms })
        } else {
            (Some(raw.poll_count), if is_write { 0 } else { raw.poll_delay_ms })
        };

        Ok(PollRequest {
            target,
            device_id,
            function,
            start_register,
            effective_start,
            num_vals,
            write_value,
            data_type,
            byte_swap: raw.byte_swap,
            word_swap: raw.word_swap,
            zero_based: raw.zero_based,
            raw_bytes: raw.raw_bytes,
            timeout_ms,
            poll_count,
            poll_delay_ms,
            csv_path: raw.csv_path,
            gpio_pin,
        })
    }

    /// Construct a [`PollRequest`] from already-normalized fields, skipping
    /// re-validation. For embedders (e.g. a GUI) that validated once up
    /// front.
    #[allow(clippy::too_many_arguments)]
    pub fn from_validated(
        target: Target,
        device_id: u8,
        function: u8,
        start_register: u32,
        effective_start: u32,
        num_vals: u32,
        write_value: Option<u16>,
        data_type: DataType,
        byte_swap: bool,
        word_swap: bool,
        zero_based: bool,
        raw_bytes: bool,
        timeout_ms: u32,
        poll_count: Option<u32>,
        poll_delay_ms: u32,
        csv_path: Option<String>,
        gpio_pin: Option<String>,
    ) -> PollRequest {
        PollRequest {
            target,
            device_id,
            function,
            start_register,
            effective_start,
            num_vals,
            write_value,
            data_type,
            byte_swap,
            word_swap,
            zero_based,
            raw_bytes,
            timeout_ms,
            poll_count,
            poll_delay_ms,
            csv_path,
            gpio_pin,
        }
    }
}
