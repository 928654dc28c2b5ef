//! Modbus protocol constants based on official specification
//!
//! These constants are derived from the official Modbus specification:
//! - Maximum PDU size: 253 bytes (inherited from RS485 ADU limit of 256 bytes)
//! - Register/coil limits are calculated to fit within the PDU size constraint

// ============================================================================
// Frame Size Constants
// ============================================================================

/// Modbus MBAP header length for TCP
/// Format: Transaction ID(2) + Protocol ID(2) + Length(2) + Unit ID(1) = 7 bytes
/// Note: Length field itself is not counted in MBAP_HEADER_LEN for frame parsing
pub const MBAP_HEADER_LEN: usize = 6;

/// Maximum PDU (Protocol Data Unit) size per Modbus specification
/// This is the fundamental limit inherited from RS485 implementation:
/// RS485 ADU (256 bytes) - Slave Address (1 byte) - CRC (2 bytes) = 253 bytes
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum MBAP length field value (Unit ID + PDU)
/// Used for validating the Length field in MBAP header
/// = 1 (Unit ID) + 253 (Max PDU) = 254 bytes
pub const MAX_MBAP_LENGTH: usize = 1 + MAX_PDU_SIZE;

/// Response buffer size for receiving Modbus frames
///
/// Calculation:
/// - MBAP Header: 6 bytes (MBAP_HEADER_LEN)
/// - Max MBAP Length (Unit ID + PDU): 254 bytes (MAX_MBAP_LENGTH)
/// - Theoretical max frame: 6 + 254 = 260 bytes
/// - Buffer size: 512 bytes (provides safety margin)
pub const MODBUS_RESPONSE_BUFFER_SIZE: usize = 512;

// ============================================================================
// Register Operation Limits
// ============================================================================

/// Maximum number of registers for FC03/FC04 (Read Holding/Input Registers)
///
/// Calculation for response PDU:
/// - Function Code: 1 byte
/// - Byte Count: 1 byte
/// - Register Data: N × 2 bytes
/// - Total: 1 + 1 + (N × 2) ≤ 253
/// - Therefore: N ≤ (253 - 2) / 2 = 125.5 → 125 registers
pub const MAX_READ_REGISTERS: usize = 125;

/// Maximum number of registers for FC16 (Write Multiple Registers)
///
/// Calculation for request PDU:
/// - Function Code: 1 byte
/// - Starting Address: 2 bytes
/// - Quantity of Registers: 2 bytes
/// - Byte Count: 1 byte
/// - Register Values: N × 2 bytes
/// - Total: 1 + 2 + 2 + 1 + (N × 2) ≤ 253
/// - Therefore: N ≤ (253 - 6) / 2 = 123.5 → 123 registers
pub const MAX_WRITE_REGISTERS: usize = 123;

// ============================================================================
// Coil Operation Limits
// ============================================================================

/// Maximum number of coils for FC01/FC02 (Read Coils/Discrete Inputs)
///
/// Calculation for response PDU:
/// - Function Code: 1 byte
/// - Byte Count: 1 byte
/// - Coil Data: ceil(N / 8) bytes
/// - Total: 1 + 1 + ceil(N / 8) ≤ 253
/// - Therefore: ceil(N / 8) ≤ 251, N ≤ 251 × 8 = 2008
/// - Spec defines: N ≤ 2000 (rounded for practical use)
pub const MAX_READ_COILS: usize = 2000;

// ============================================================================
// Modbus Function Codes
// ============================================================================

/// Read Coils (FC01)
pub const FC_READ_COILS: u8 = 0x01;

/// Read Discrete Inputs (FC02)
pub const FC_READ_DISCRETE_INPUTS: u8 = 0x02;

/// Read Holding Registers (FC03)
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;

/// Read Input Registers (FC04)
pub const FC_READ_INPUT_REGISTERS: u8 = 0x04;

/// Write Single Coil (FC05)
pub const FC_WRITE_SINGLE_COIL: u8 = 0x05;

/// Write Single Register (FC06)
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Write Multiple Registers (FC16)
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

// ============================================================================
// Modbus Exception Codes
// ============================================================================

/// Illegal Function
pub const EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;

/// Illegal Data Address
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;

/// Illegal Data Value
pub const EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;

/// Server Device Failure
pub const EXCEPTION_SERVER_DEVICE_FAILURE: u8 = 0x04;

/// Acknowledge
pub const EXCEPTION_ACKNOWLEDGE: u8 = 0x05;

/// Server Device Busy
pub const EXCEPTION_SERVER_DEVICE_BUSY: u8 = 0x06;

/// Memory Parity Error
pub const EXCEPTION_MEMORY_PARITY_ERROR: u8 = 0x08;

/// Gateway Path Unavailable
pub const EXCEPTION_GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;

/// Gateway Target Device Failed to Respond
pub const EXCEPTION_GATEWAY_TARGET_FAILED: u8 = 0x0B;

// ============================================================================
// Validation limits for poll requests
// ============================================================================

/// Lowest valid unit/device id.
pub const MIN_DEVICE_ID: u16 = 1;
/// Highest valid unit/device id.
pub const MAX_DEVICE_ID: u16 = 255;

/// Lowest valid starting register address.
pub const MIN_START_REGISTER: u32 = 0;
/// Highest valid starting register address.
pub const MAX_START_REGISTER: u32 = 99990;

/// Lowest valid register/value count for a poll request.
pub const MIN_NUM_VALS: u32 = 1;
/// Highest valid register/value count for a poll request.
pub const MAX_NUM_VALS: u32 = 99990;

/// Lowest valid timeout, in milliseconds.
pub const MIN_TIMEOUT_MS: u32 = 1;
/// Highest valid timeout, in milliseconds.
pub const MAX_TIMEOUT_MS: u32 = 10_000;

/// Function codes the poll engine accepts.
pub const SUPPORTED_FUNCTION_CODES: [u8; 7] = [1, 2, 3, 4, 5, 6, 16];

/// Fixed allow-list of 24 GPIO board-pin labels used for RS-485 direction
/// control. These are the even-numbered physical pins of a 40-pin header;
/// the core only validates the token, it never drives hardware.
pub const GPIO_BOARD_PINS: [&str; 24] = [
    "PIN_3", "PIN_5", "PIN_7", "PIN_8", "PIN_10", "PIN_11", "PIN_12", "PIN_13", "PIN_15",
    "PIN_16", "PIN_18", "PIN_19", "PIN_21", "PIN_22", "PIN_23", "PIN_24", "PIN_26", "PIN_27",
    "PIN_28", "PIN_29", "PIN_31", "PIN_32", "PIN_33", "PIN_35",
];

// ============================================================================
// Error taxonomy codes (closed set — see the error module for descriptions)
// ============================================================================

pub const ERR_INVALID_FUNCTION: u16 = 1;
pub const ERR_INVALID_ADDRESS: u16 = 2;
pub const ERR_INVALID_VALUE: u16 = 3;
pub const ERR_INVALID_DEVICE_ID: u16 = 10;
pub const ERR_TCP_CONNECT_FAILED: u16 = 19;
pub const ERR_COMM_TIMEOUT: u16 = 87;
pub const ERR_INVALID_TARGET_SPEC: u16 = 101;
pub const ERR_INVALID_DATA_TYPE: u16 = 102;
pub const ERR_INVALID_REGISTER_LOOKUP: u16 = 103;
pub const ERR_INVALID_FILE_NAME: u16 = 104;
pub const ERR_CANNOT_OPEN_SINK: u16 = 105;
pub const ERR_UNEXPECTED_RETURN: u16 = 106;
pub const ERR_USER_CANCELLED: u16 = 107;
pub const ERR_TCP_LENGTH_MISMATCH: u16 = 108;
pub const ERR_MESSAGE_LENGTH_MISMATCH: u16 = 109;
pub const ERR_UNEXPECTED_FUNCTION: u16 = 110;
pub const ERR_UNEXPECTED_DEVICE_ID: u16 = 111;
pub const ERR_MULTI_POLL_WITH_WRITE: u16 = 112;
pub const ERR_CRC_MISMATCH: u16 = 113;
pub const ERR_UNKNOWN_REMOTE_CODE: u16 = 114;
pub const ERR_SERIAL_OPEN_TIMEOUT: u16 = 115;
pub const ERR_INVALID_GPIO_PIN: u16 = 116;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_constants() {
        assert_eq!(MBAP_HEADER_LEN, 6);
        assert_eq!(MAX_PDU_SIZE, 253);
        assert_eq!(MAX_MBAP_LENGTH, 254);
    }

    #[test]
    fn test_register_limits() {
        // Verify read register limit calculation
        let read_pdu_size = 1 + 1 + (MAX_READ_REGISTERS * 2);
        assert!(read_pdu_size <= MAX_PDU_SIZE);
        assert_eq!(MAX_READ_REGISTERS, 125);

        // Verify write register limit calculation
        let write_pdu_size = 1 + 2 + 2 + 1 + (MAX_WRITE_REGISTERS * 2);
        assert!(write_pdu_size <= MAX_PDU_SIZE);
        assert_eq!(MAX_WRITE_REGISTERS, 123);
    }

    #[test]
    fn test_coil_limits() {
        let read_coil_bytes = MAX_READ_COILS.div_ceil(8);
        let read_coil_pdu = 1 + 1 + read_coil_bytes;
        assert!(read_coil_pdu <= MAX_PDU_SIZE);
        assert_eq!(MAX_READ_COILS, 2000);
    }
}
