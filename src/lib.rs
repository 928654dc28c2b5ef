//! # mbpoll - Async Modbus TCP/RTU Polling Client
//!
//! **Author:** Evan Liu <liuyifanz.1996@gmail.com>
//! **Version:** 0.5.1
//! **License:** MIT
//!
//! A Modbus TCP/RTU client built around a single operation: open a
//! connection, poll a register range on a fixed cadence (once, N times, or
//! forever), and decode each response into a typed value sequence. Pure
//! Rust, no unsafe code.
//!
//! ## Supported Function Codes
//!
//! | Code | Function | Supported |
//! |------|----------|-----------|
//! | 0x01 | Read Coils | ✅ |
//! | 0x02 | Read Discrete Inputs | ✅ |
//! | 0x03 | Read Holding Registers | ✅ |
//! | 0x04 | Read Input Registers | ✅ |
//! | 0x05 | Write Single Coil | ✅ |
//! | 0x06 | Write Single Register | ✅ |
//! | 0x10 | Write Multiple Registers | ✅ |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mbpoll::engine::{poll, Cancel};
//! use mbpoll::protocol::{PollRequest, RawPollRequest};
//! use mbpoll::utils::NullObserver;
//!
//! #[tokio::main]
//! async fn main() -> mbpoll::ModbusResult<()> {
//!     let request = PollRequest::build(RawPollRequest {
//!         target_spec: "127.0.0.1".into(),
//!         tcp_port: 502,
//!         device_id: 1,
//!         function: 3,
//!         start_register: 1,
//!         num_vals: 10,
//!         write_value: None,
//!         data_type: "uint16".into(),
//!         byte_swap: false,
//!         word_swap: false,
//!         zero_based: false,
//!         raw_bytes: false,
//!         timeout_ms: 1000,
//!         poll_count: 1,
//!         poll_delay_ms: 1000,
//!         csv_path: None,
//!         gpio_pin: None,
//!     })?;
//!
//!     let mut observer = NullObserver;
//!     let cancel = Cancel::new();
//!     match poll(&request, &mut observer, &cancel).await {
//!         Ok(values) => println!("read: {values:?}"),
//!         Err(record) => println!("{record}"),
//!     }
//!     Ok(())
//! }
//! ```

/// Core error types and the `("Err", code, description)` boundary representation.
pub mod error;

/// Modbus protocol constants: frame sizes, function/exception codes, and
/// the closed error-taxonomy code table.
pub mod constants;

/// Hand-rolled CRC-16/MODBUS lookup table and checksum helpers.
pub mod crc;

/// Typed value model (`Value`, `DataType`) for the register decoder.
pub mod value;

/// Byte-swap, register assembly, and word-swap primitives.
pub mod bytes;

/// Register decoder: PDU payload bytes -> a sequence of typed `Value`s.
pub mod codec;

/// Request frame builder (RTU/TCP framing, function-specific PDUs).
pub mod pdu;

/// Response frame extraction and validation.
pub mod response;

/// Request validation and the immutable `PollRequest` data model.
pub mod protocol;

/// Async transport abstraction (TCP, optionally RTU) and half-duplex direction control.
pub mod transport;

/// Poll observers, CSV sink, and run counters.
pub mod utils;

/// Diagnostics: `tracing` integration and the callback logger.
pub mod logging;

/// The poll engine state machine.
pub mod engine;

pub use constants::*;
pub use engine::{poll, poll_silent, Cancel, PollOutcome};
pub use error::{ErrorRecord, ModbusError, ModbusResult};
pub use logging::{CallbackLogger, LogCallback, LogLevel};
pub use pdu::{build_fc16_fixed_pdu, build_fc16_pdu, build_request, Framing, RequestPacket};
pub use protocol::{PollRequest, RawPollRequest, Target};
pub use transport::{Direction, LineDirection, ModbusTransport, NoopDirection, TcpTransport, TransportStats};
pub use utils::{NullObserver, PollMetrics, PollObserver, Row};
pub use value::{DataType, Value};

#[cfg(feature = "rtu")]
pub use transport::RtuTransport;

/// Default timeout for operations (5 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Modbus TCP default port.
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
