//! Transport abstraction (component design §4.7): the narrow interface the
//! poll engine drives — open, write, read-up-to-N-with-timeout, close, plus
//! an optional half-duplex direction port.
//!
//! Concrete transports (`TcpTransport`, `RtuTransport`) are thin wrappers
//! over `tokio`/`tokio-serial`, grounded on the teacher crate's transport
//! usage in its client module. GPIO direction control stays an external
//! collaborator: [`LineDirection`] is a two-state port the engine calls
//! into, with a no-op default for transports that don't need it.

use crate::error::{ModbusError, ModbusResult};
use std::io;
use std::time::Duration;

/// Which way a half-duplex RS-485 line is currently pointed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Transmit,
    Receive,
}

/// A two-state digital-output abstraction for RS-485 direction control.
/// The core never touches hardware directly; this trait is the seam an
/// external GPIO collaborator implements.
pub trait LineDirection: Send {
    fn set_direction(&mut self, direction: Direction);
}

/// The default no-op direction port, used when no GPIO pin was configured.
pub struct NoopDirection;

impl LineDirection for NoopDirection {
    fn set_direction(&mut self, _direction: Direction) {}
}

/// Counters the engine and callers can inspect after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// The narrow interface the poll engine needs from a transport.
#[allow(async_fn_in_trait)]
pub trait ModbusTransport: Send {
    /// Write a full request frame.
    async fn send(&mut self, frame: &[u8]) -> ModbusResult<()>;

    /// Wait up to `timeout` for a response and read at most `max_len` bytes.
    /// Returns whatever bytes arrived before the timeout or `max_len` was
    /// reached; an empty vec means "timed out with nothing received".
    async fn recv(&mut self, max_len: usize, timeout: Duration) -> ModbusResult<Vec<u8>>;

    fn is_connected(&self) -> bool;

    fn stats(&self) -> TransportStats;

    /// Half-duplex direction control; a no-op for transports that don't
    /// need it (the default TCP transport, or an RTU transport with no
    /// configured GPIO pin).
    fn set_direction(&mut self, _direction: Direction) {}
}

/// TCP transport over `tokio::net::TcpStream`.
pub struct TcpTransport {
    stream: tokio::net::TcpStream,
    stats: TransportStats,
}

impl TcpTransport {
    /// Open a TCP connection, bounded by `timeout` (component design §4.6,
    /// state `Opening`). Failure maps to error 19.
    pub async fn connect(host: std::net::Ipv4Addr, port: u16, timeout: Duration) -> ModbusResult<Self> {
        let addr = (host, port);
        let connect = tokio::net::TcpStream::connect(addr);
        match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(stream)) => {
                let _ = stream.set_nodelay(true);
                Ok(TcpTransport {
                    stream,
                    stats: TransportStats::default(),
                })
            }
            Ok(Err(e)) => Err(ModbusError::TcpConnectFailed {
                message: e.to_string(),
            }),
            Err(_) => Err(ModbusError::TcpConnectFailed {
                message: "connection attempt timed out".to_string(),
            }),
        }
    }
}

impl ModbusTransport for TcpTransport {
    async fn send(&mut self, frame: &[u8]) -> ModbusResult<()> {
        use tokio::io::AsyncWriteExt;
        self.stream
            .write_all(frame)
            .await
            .map_err(|_| ModbusError::UnexpectedReturn)?;
        self.stats.requests_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        Ok(())
    }

    async fn recv(&mut self, max_len: usize, timeout: Duration) -> ModbusResult<Vec<u8>> {
        use tokio::io::AsyncReadExt;
        let mut buf = vec![0u8; max_len];
        match tokio::time::timeout(timeout, self.stream.read(&mut buf)).await {
            Ok(Ok(0)) => Err(ModbusError::UnexpectedReturn),
            Ok(Ok(n)) => {
                buf.truncate(n);
                self.stats.responses_received += 1;
                self.stats.bytes_received += n as u64;
                Ok(buf)
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionReset => {
                Err(ModbusError::UnexpectedReturn)
            }
            Ok(Err(_)) => Err(ModbusError::UnexpectedReturn),
            Err(_) => Ok(Vec::new()),
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.peer_addr().is_ok()
    }

    fn stats(&self) -> TransportStats {
        self.stats
    }
}

/// RTU transport over a serial port, with an optional GPIO direction port
/// for half-duplex RS-485 lines.
#[cfg(feature = "rtu")]
pub struct RtuTransport {
    port: tokio_serial::SerialStream,
    stats: TransportStats,
    direction: Box<dyn LineDirection>,
}

#[cfg(feature = "rtu")]
impl RtuTransport {
    /// Open a serial port, retrying on "port busy" until `timeout` elapses
    /// (component design §5: the serial-open attempt retries until the
    /// timeout elapses before giving up with error 115).
    pub async fn open(name: &str, baud: u32, timeout: Duration) -> ModbusResult<Self> {
        use tokio_serial::SerialPortBuilderExt;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio_serial::new(name, baud).open_native_async() {
                Ok(port) => {
                    return Ok(RtuTransport {
                        port,
                        stats: TransportStats::default(),
                        direction: Box::new(NoopDirection),
                    })
                }
                Err(_) if tokio::time::Instant::now() < deadline => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                Err(_) => return Err(ModbusError::SerialOpenTimeout),
            }
        }
    }

    /// Attach a GPIO direction port for half-duplex control.
    pub fn with_direction(mut self, direction: Box<dyn LineDirection>) -> Self {
        self.direction = direction;
        self
    }
}

#[cfg(feature = "rtu")]
impl ModbusTransport for RtuTransport {
    async fn send(&mut self, frame: &[u8]) -> ModbusResult<()> {
        use tokio::io::AsyncWriteExt;
        self.direction.set_direction(Direction::Transmit);
        let result = self.port.write_all(frame).await;
        self.direction.set_direction(Direction::Receive);
        result.map_err(|_| ModbusError::UnexpectedReturn)?;
        self.stats.requests_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        Ok(())
    }

    async fn recv(&mut self, max_len: usize, timeout: Duration) -> ModbusResult<Vec<u8>> {
        use tokio::io::AsyncReadExt;
        let mut buf = vec![0u8; max_len];
        match tokio::time::timeout(timeout, self.port.read(&mut buf)).await {
            Ok(Ok(0)) => Err(ModbusError::UnexpectedReturn),
            Ok(Ok(n)) => {
                buf.truncate(n);
                self.stats.responses_received += 1;
                self.stats.bytes_received += n as u64;
                Ok(buf)
            }
            Ok(Err(_)) => Err(ModbusError::UnexpectedReturn),
            Err(_) => Ok(Vec::new()),
        }
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn stats(&self) -> TransportStats {
        self.stats
    }

    fn set_direction(&mut self, direction: Direction) {
        self.direction.set_direction(direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingDirection {
        calls: Vec<Direction>,
    }

    impl LineDirection for RecordingDirection {
        fn set_direction(&mut self, direction: Direction) {
            self.calls.push(direction);
        }
    }

    #[test]
    fn noop_direction_accepts_both_states() {
        let mut port = NoopDirection;
        port.set_direction(Direction::Transmit);
        port.set_direction(Direction::Receive);
    }

    #[test]
    fn recording_direction_tracks_toggles() {
        let mut port = RecordingDirection { calls: Vec::new() };
        port.set_direction(Direction::Transmit);
        port.set_direction(Direction::Receive);
        assert_eq!(port.calls, vec![Direction::Transmit, Direction::Receive]);
    }

    #[test]
    fn transport_stats_default_is_zeroed() {
        assert_eq!(TransportStats::default(), TransportStats {
            requests_sent: 0,
            responses_received: 0,
            bytes_sent: 0,
            bytes_received: 0,
        });
    }
}
