//! Poll engine (component design §4.6): one transport connection, a bounded
//! or unbounded loop of request/response cycles at a fixed cadence.
//!
//! State machine: `Opening -> Ready -> Sending -> Awaiting -> Decoding ->
//! Sleeping -> (Ready|Terminated)`. The states are expressed as the control
//! flow of [`run`] rather than as an explicit enum — mirroring how the
//! source's `mb_poll` function is a single loop with the same phases
//! inlined, but routed here through the typed building blocks the rest of
//! the crate provides instead of raw socket calls.

use crate::codec::{decode_registers, registers_needed, DecodeOptions};
use crate::constants::MODBUS_RESPONSE_BUFFER_SIZE;
use crate::error::{ErrorRecord, ModbusError, ModbusResult};
use crate::pdu::{build_fc16_fixed_pdu, build_request, expected_response_length, Framing};
use crate::protocol::{PollRequest, Target};
use crate::response::{extract_pdu, validate_pdu, ValidatedResponse};
use crate::transport::{Direction, ModbusTransport, TcpTransport};
use crate::utils::{NullObserver, PollMetrics, PollObserver, Row};
use crate::value::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Either the last successful [`Value`] sequence, or a fatal [`ErrorRecord`].
pub type PollOutcome = Result<Vec<Value>, ErrorRecord>;

/// Cooperative cancellation flag shared between the caller and a running
/// poll. Checked only between blocking operations, per the concurrency
/// model's cancellation semantics.
#[derive(Clone, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    pub fn new() -> Self {
        Cancel(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

async fn sleep_cancelable(duration: Duration, cancel: &Cancel) {
    const SLICE: Duration = Duration::from_millis(25);
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if cancel.is_cancelled() {
            return;
        }
        let step = remaining.min(SLICE);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
}

/// Open the transport named by `request.target` and run the poll loop,
/// routing observer callbacks and returning the final outcome.
///
/// `Opening` failures map to error 19 (TCP) or 115 (serial) per the state
/// machine.
pub async fn poll(
    request: &PollRequest,
    observer: &mut impl PollObserver,
    cancel: &Cancel,
) -> PollOutcome {
    let timeout = Duration::from_millis(request.timeout_ms as u64);
    match &request.target {
        Target::Tcp { host, port } => {
            let transport = TcpTransport::connect(*host, *port, timeout)
                .await
                .map_err(ModbusError::into_record)?;
            run(transport, request, observer, cancel).await
        }
        Target::Serial { name, baud } => {
            #[cfg(feature = "rtu")]
            {
                let transport = crate::transport::RtuTransport::open(name, *baud, timeout)
                    .await
                    .map_err(ModbusError::into_record)?;
                run(transport, request, observer, cancel).await
            }
            #[cfg(not(feature = "rtu"))]
            {
                let _ = (name, baud);
                Err(ModbusError::SerialOpenTimeout.into_record())
            }
        }
    }
}

/// Run the poll loop against an already-open transport. Exposed separately
/// from [`poll`] so tests (and callers with their own transport) can drive
/// it against a mock.
pub async fn run<T: ModbusTransport>(
    mut transport: T,
    request: &PollRequest,
    observer: &mut impl PollObserver,
    cancel: &Cancel,
) -> PollOutcome {
    let framing = match request.target {
        Target::Tcp { .. } => Framing::Tcp,
        Target::Serial { .. } => Framing::Rtu,
    };
    let is_write = matches!(request.function, 5 | 6 | 16);
    let start_reg = request.effective_start as u16;
    let timeout = Duration::from_millis(request.timeout_ms as u64);

    let mut remaining = request.poll_count;
    let mut last_values: Option<Vec<Value>> = None;
    let mut last_error: Option<ErrorRecord> = None;
    let mut metrics = PollMetrics::default();

    loop {
        if cancel.is_cancelled() {
            return on_cancel(request, last_values, last_error);
        }
        if remaining == Some(0) {
            break;
        }

        let poll_start = tokio::time::Instant::now();

        let (packet, num_regs_for_response) = match build_outbound(request, framing, start_reg) {
            Ok(pair) => pair,
            Err(e) => return Err(e.into_record()),
        };
        let expected_len = expected_response_length(request.function, num_regs_for_response);

        transport.set_direction(Direction::Transmit);
        if let Err(e) = transport.send(&packet.bytes).await {
            return Err(e.into_record());
        }
        transport.set_direction(Direction::Receive);

        let recv_len = expected_len.max(64).min(MODBUS_RESPONSE_BUFFER_SIZE);
        let raw = match transport.recv(recv_len, timeout).await {
            Ok(bytes) if bytes.is_empty() => {
                record_retryable(&mut metrics, observer, &mut last_error, ModbusError::CommTimeout);
                tick(&mut remaining);
                sleep_cancelable(
                    remaining_delay(request, poll_start, is_write),
                    cancel,
                )
                .await;
                continue;
            }
            Ok(bytes) => bytes,
            Err(e) if e.is_fatal() => return Err(e.into_record()),
            Err(e) => {
                record_retryable(&mut metrics, observer, &mut last_error, e);
                tick(&mut remaining);
                sleep_cancelable(remaining_delay(request, poll_start, is_write), cancel).await;
                continue;
            }
        };

        let decoded = decode_response(request, framing, &raw, is_write, packet.expected_echo.as_deref());
        match decoded {
            Ok(values) => {
                metrics.record_success();
                let timestamp = request.csv_path.is_some().then(now_iso);
                observer.on_row(&Row {
                    timestamp,
                    values: values.clone(),
                });
                last_values = Some(values);
            }
            Err(e) if e.is_fatal() => return Err(e.into_record()),
            Err(e) => {
                record_retryable(&mut metrics, observer, &mut last_error, e);
            }
        }

        tick(&mut remaining);
        if remaining != Some(0) {
            sleep_cancelable(remaining_delay(request, poll_start, is_write), cancel).await;
        }
    }

    last_values
        .map(Ok)
        .unwrap_or_else(|| Err(last_error.unwrap_or_else(|| ModbusError::CommTimeout.into_record())))
}

fn tick(remaining: &mut Option<u32>) {
    if let Some(n) = remaining {
        *n = n.saturating_sub(1);
    }
}

fn remaining_delay(request: &PollRequest, poll_start: tokio::time::Instant, is_write: bool) -> Duration {
    if is_write {
        return Duration::ZERO;
    }
    let target = Duration::from_millis(request.poll_delay_ms as u64);
    let elapsed = poll_start.elapsed();
    target.saturating_sub(elapsed)
}

fn record_retryable(
    metrics: &mut PollMetrics,
    observer: &mut impl PollObserver,
    last_error: &mut Option<ErrorRecord>,
    error: ModbusError,
) {
    metrics.record_failure();
    let record = error.into_record();
    observer.on_error(&record);
    *last_error = Some(record);
}

fn on_cancel(
    request: &PollRequest,
    last_values: Option<Vec<Value>>,
    last_error: Option<ErrorRecord>,
) -> PollOutcome {
    if request.poll_count.is_some() {
        Err(ModbusError::UserCancelled.into_record())
    } else {
        last_values
            .map(Ok)
            .unwrap_or_else(|| Err(last_error.unwrap_or_else(|| ModbusError::UserCancelled.into_record())))
    }
}

struct Outbound {
    bytes: Vec<u8>,
    expected_echo: Option<Vec<u8>>,
}

fn build_outbound(
    request: &PollRequest,
    framing: Framing,
    start_reg: u16,
) -> ModbusResult<(Outbound, usize)> {
    if request.function == 16 {
        let packet = build_fc16_fixed_pdu(framing, request.device_id, start_reg);
        return Ok((
            Outbound {
                bytes: packet.bytes,
                expected_echo: packet.expected_echo,
            },
            4,
        ));
    }

    let is_write = matches!(request.function, 5 | 6);
    let arg = if is_write {
        request.write_value.unwrap_or(0)
    } else if matches!(request.function, 1 | 2) {
        request.num_vals as u16
    } else {
        registers_needed(request.data_type, request.num_vals as usize) as u16
    };

    let packet = build_request(framing, request.device_id, request.function, start_reg, arg)?;
    let num_regs = arg as usize;
    Ok((
        Outbound {
            bytes: packet.bytes,
            expected_echo: packet.expected_echo,
        },
        num_regs,
    ))
}

fn decode_response(
    request: &PollRequest,
    framing: Framing,
    raw: &[u8],
    is_write: bool,
    expected_echo: Option<&[u8]>,
) -> ModbusResult<Vec<Value>> {
    let pdu = extract_pdu(framing, raw)?;
    let validated = validate_pdu(&pdu, request.device_id, request.function, is_write, expected_echo)?;
    match validated {
        ValidatedResponse::WriteAck => Ok(vec![Value::UInt(request.write_value.unwrap_or(0) as u64)]),
        ValidatedResponse::Read { payload } => {
            let opts = DecodeOptions {
                byte_swap: request.byte_swap,
                word_swap: request.word_swap,
                raw_bytes: request.raw_bytes,
            };
            Ok(decode_registers(
                &payload,
                request.function,
                request.data_type,
                opts,
                request.num_vals as usize,
            ))
        }
    }
}

fn now_iso() -> String {
    #[cfg(feature = "std")]
    {
        chrono::Utc::now().to_rfc3339()
    }
    #[cfg(not(feature = "std"))]
    {
        String::new()
    }
}

/// Run a poll with no observer, for callers that only want the final
/// outcome.
pub async fn poll_silent(request: &PollRequest, cancel: &Cancel) -> PollOutcome {
    let mut observer = NullObserver;
    poll(request, &mut observer, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportStats;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A canned-response transport, grounded on the teacher's `MockTransport`
    /// test helper: a queue of responses plus a log of frames sent.
    struct MockTransport {
        responses: Mutex<VecDeque<ModbusResult<Vec<u8>>>>,
        sent: Mutex<Vec<Vec<u8>>>,
        stats: TransportStats,
    }

    impl MockTransport {
        fn new(responses: Vec<ModbusResult<Vec<u8>>>) -> Self {
            MockTransport {
                responses: Mutex::new(responses.into()),
                sent: Mutex::new(Vec::new()),
                stats: TransportStats::default(),
            }
        }
    }

    impl ModbusTransport for MockTransport {
        async fn send(&mut self, frame: &[u8]) -> ModbusResult<()> {
            self.sent.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        async fn recv(&mut self, _max_len: usize, _timeout: Duration) -> ModbusResult<Vec<u8>> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Vec::new()))
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn stats(&self) -> TransportStats {
            self.stats
        }
    }

    fn sample_request(function: u8, poll_count: Option<u32>) -> PollRequest {
        crate::protocol::PollRequest::from_validated(
            Target::Tcp {
                host: "127.0.0.1".parse().unwrap(),
                port: 502,
            },
            1,
            function,
            1,
            0,
            1,
            None,
            crate::value::DataType::Uint16,
            false,
            false,
            false,
            false,
            1000,
            poll_count,
            10,
            None,
            None,
        )
    }

    #[tokio::test]
    async fn read_holding_register_success() {
        let mut response = vec![0x01, 0x03, 0x02, 0x00, 0x2A];
        crate::crc::append_crc(&mut response);
        let transport = MockTransport::new(vec![Ok(response)]);
        let request = sample_request(3, Some(1));
        let cancel = Cancel::new();
        let mut observer = NullObserver;
        let outcome = run(transport, &request, &mut observer, &cancel).await;
        assert_eq!(outcome, Ok(vec![Value::UInt(42)]));
    }

    #[tokio::test]
    async fn timeout_is_retryable_and_returned_at_end_of_bounded_run() {
        let transport = MockTransport::new(vec![Ok(Vec::new()), Ok(Vec::new())]);
        let request = sample_request(3, Some(2));
        let cancel = Cancel::new();
        let mut observer = NullObserver;
        let outcome = run(transport, &request, &mut observer, &cancel).await;
        assert_eq!(outcome, Err(ModbusError::CommTimeout.into_record()));
    }

    #[tokio::test]
    async fn fatal_tcp_length_mismatch_breaks_loop() {
        let transport = MockTransport::new(vec![Ok(vec![0, 0, 0, 0, 0, 99, 1, 3])]);
        let request = sample_request(3, Some(5));
        let cancel = Cancel::new();
        let mut observer = NullObserver;
        let outcome = run(transport, &request, &mut observer, &cancel).await;
        assert_eq!(outcome, Err(ModbusError::TcpLengthMismatch.into_record()));
    }

    #[tokio::test]
    async fn cancellation_before_first_poll_is_error_107_when_bounded() {
        let transport = MockTransport::new(vec![]);
        let request = sample_request(3, Some(3));
        let cancel = Cancel::new();
        cancel.cancel();
        let mut observer = NullObserver;
        let outcome = run(transport, &request, &mut observer, &cancel).await;
        assert_eq!(outcome, Err(ModbusError::UserCancelled.into_record()));
    }
}
