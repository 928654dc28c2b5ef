//! Error taxonomy for the poll engine and its supporting components.
//!
//! Internally every fallible operation returns [`ModbusError`], an
//! exhaustively-matched enum. At the two public boundaries (request
//! construction and the poll engine's return value) a [`ModbusError`] is
//! converted to an [`ErrorRecord`] — the `("Err", code, description)` triple
//! that external callers discriminate on, matching the closed error table.

use crate::constants::*;
use std::fmt;

/// Errors produced while validating, framing, or polling.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ModbusError {
    #[error("invalid function code {code}")]
    InvalidFunction { code: u16 },

    #[error("invalid register address or count: {message}")]
    InvalidAddress { message: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[error("invalid device id {id}")]
    InvalidDeviceId { id: u16 },

    #[error("cannot establish TCP connection: {message}")]
    TcpConnectFailed { message: String },

    #[error("no response within timeout window")]
    CommTimeout,

    #[error("invalid IP address or serial port spec: {spec}")]
    InvalidTargetSpec { spec: String },

    #[error("invalid data type token {token:?}")]
    InvalidDataType { token: String },

    #[error("zero-based register lookup went negative")]
    InvalidRegisterLookup,

    #[error("invalid CSV file name {name:?}")]
    InvalidFileName { name: String },

    #[error("cannot open CSV sink: {message}")]
    CannotOpenSink { message: String },

    #[error("unexpected return or socket closed")]
    UnexpectedReturn,

    #[error("user cancelled the poll")]
    UserCancelled,

    #[error("TCP MBAP length mismatch")]
    TcpLengthMismatch,

    #[error("Modbus message length mismatch")]
    MessageLengthMismatch,

    #[error("unexpected function code {got} in response (expected {expected})")]
    UnexpectedFunction { expected: u8, got: u8 },

    #[error("unexpected device id {got} in response (expected {expected})")]
    UnexpectedDeviceId { expected: u8, got: u8 },

    #[error("write echo PDU does not match the request")]
    WriteEchoMismatch,

    #[error("multiple polls requested with a write command")]
    MultiPollWithWrite,

    #[error("CRC mismatch in RTU response")]
    CrcMismatch,

    #[error("unknown error code {code} reported by remote device")]
    UnknownRemoteCode { code: u16 },

    #[error("cannot open serial port within timeout")]
    SerialOpenTimeout,

    #[error("invalid GPIO pin {pin:?}")]
    InvalidGpioPin { pin: String },

    /// A Modbus exception reported by the remote device (codes 1-11).
    #[error("Modbus exception {code}: {message}")]
    RemoteException { code: u8, message: String },

    /// A gateway-specific passthrough code (224-228).
    #[error("gateway passthrough code {code}")]
    GatewayPassthrough { code: u16 },
}

impl ModbusError {
    /// Numeric code from the closed taxonomy in the external interfaces table.
    pub fn code(&self) -> u16 {
        match self {
            ModbusError::InvalidFunction { .. } => ERR_INVALID_FUNCTION,
            ModbusError::InvalidAddress { .. } => ERR_INVALID_ADDRESS,
            ModbusError::InvalidValue { .. } => ERR_INVALID_VALUE,
            ModbusError::InvalidDeviceId { .. } => ERR_INVALID_DEVICE_ID,
            ModbusError::TcpConnectFailed { .. } => ERR_TCP_CONNECT_FAILED,
            ModbusError::CommTimeout => ERR_COMM_TIMEOUT,
            ModbusError::InvalidTargetSpec { .. } => ERR_INVALID_TARGET_SPEC,
            ModbusError::InvalidDataType { .. } => ERR_INVALID_DATA_TYPE,
            ModbusError::InvalidRegisterLookup => ERR_INVALID_REGISTER_LOOKUP,
            ModbusError::InvalidFileName { .. } => ERR_INVALID_FILE_NAME,
            ModbusError::CannotOpenSink { .. } => ERR_CANNOT_OPEN_SINK,
            ModbusError::UnexpectedReturn => ERR_UNEXPECTED_RETURN,
            ModbusError::UserCancelled => ERR_USER_CANCELLED,
            ModbusError::TcpLengthMismatch => ERR_TCP_LENGTH_MISMATCH,
            ModbusError::MessageLengthMismatch => ERR_MESSAGE_LENGTH_MISMATCH,
            ModbusError::UnexpectedFunction { .. } => ERR_UNEXPECTED_FUNCTION,
            ModbusError::UnexpectedDeviceId { .. } => ERR_UNEXPECTED_DEVICE_ID,
            ModbusError::WriteEchoMismatch => ERR_UNEXPECTED_DEVICE_ID,
            ModbusError::MultiPollWithWrite => ERR_MULTI_POLL_WITH_WRITE,
            ModbusError::CrcMismatch => ERR_CRC_MISMATCH,
            ModbusError::UnknownRemoteCode { code } => *code,
            ModbusError::SerialOpenTimeout => ERR_SERIAL_OPEN_TIMEOUT,
            ModbusError::InvalidGpioPin { .. } => ERR_INVALID_GPIO_PIN,
            ModbusError::RemoteException { code, .. } => *code as u16,
            ModbusError::GatewayPassthrough { code } => *code,
        }
    }

    /// True for errors that must break the current connection/poll loop
    /// rather than simply being recorded and retried on the next poll.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ModbusError::UnexpectedReturn
                | ModbusError::TcpLengthMismatch
                | ModbusError::TcpConnectFailed { .. }
                | ModbusError::SerialOpenTimeout
                | ModbusError::UserCancelled
        )
    }

    /// Convert to the wire-level `("Err", code, description)` triple.
    pub fn into_record(self) -> ErrorRecord {
        let code = self.code();
        let description = self.to_string();
        ErrorRecord { code, description }
    }
}

/// The `("Err", code, description)` triple external callers discriminate on.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub code: u16,
    pub description: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Err({}, {})", self.code, self.description)
    }
}

impl From<ModbusError> for ErrorRecord {
    fn from(err: ModbusError) -> Self {
        err.into_record()
    }
}

/// Result alias used throughout the crate.
pub type ModbusResult<T> = Result<T, ModbusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_taxonomy() {
        assert_eq!(ModbusError::InvalidFunction { code: 99 }.code(), 1);
        assert_eq!(ModbusError::CommTimeout.code(), 87);
        assert_eq!(ModbusError::CrcMismatch.code(), 113);
        assert_eq!(ModbusError::InvalidGpioPin { pin: "X".into() }.code(), 116);
    }

    #[test]
    fn fatal_set_matches_framing_rules() {
        assert!(ModbusError::UnexpectedReturn.is_fatal());
        assert!(ModbusError::TcpLengthMismatch.is_fatal());
        assert!(!ModbusError::CommTimeout.is_fatal());
        assert!(!ModbusError::CrcMismatch.is_fatal());
        assert!(!ModbusError::UnexpectedFunction { expected: 3, got: 4 }.is_fatal());
    }

    #[test]
    fn into_record_round_trips_code() {
        let record: ErrorRecord = ModbusError::CrcMismatch.into();
        assert_eq!(record.code, 113);
        assert!(record.description.contains("CRC"));
    }
}
