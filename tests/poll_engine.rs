use mbpoll::engine::{run, Cancel};
use mbpoll::protocol::{PollRequest, Target};
use mbpoll::transport::{ModbusTransport, TransportStats};
use mbpoll::utils::{NullObserver, Row};
use mbpoll::value::{DataType, Value};
use mbpoll::{ModbusError, PollObserver, ModbusResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

struct ScriptedTransport {
    responses: Mutex<VecDeque<ModbusResult<Vec<u8>>>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<ModbusResult<Vec<u8>>>) -> Self {
        ScriptedTransport {
            responses: Mutex::new(responses.into()),
        }
    }
}

impl ModbusTransport for ScriptedTransport {
    async fn send(&mut self, _frame: &[u8]) -> ModbusResult<()> {
        Ok(())
    }

    async fn recv(&mut self, _max_len: usize, _timeout: Duration) -> ModbusResult<Vec<u8>> {
        self.responses.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn stats(&self) -> TransportStats {
        TransportStats::default()
    }
}

#[derive(Default)]
struct RecordingObserver {
    rows: Vec<Row>,
    errors: Vec<mbpoll::ErrorRecord>,
}

impl PollObserver for RecordingObserver {
    fn on_row(&mut self, row: &Row) {
        self.rows.push(row.clone());
    }

    fn on_error(&mut self, error: &mbpoll::ErrorRecord) {
        self.errors.push(error.clone());
    }
}

fn base_request(function: u8, num_vals: u32, poll_count: Option<u32>) -> PollRequest {
    PollRequest::from_validated(
        Target::Tcp {
            host: "127.0.0.1".parse().unwrap(),
            port: 502,
        },
        1,
        function,
        1,
        0,
        num_vals,
        None,
        DataType::Uint16,
        false,
        false,
        false,
        false,
        500,
        poll_count,
        5,
        None,
        None,
    )
}

fn tcp_frame(pdu: &[u8]) -> Vec<u8> {
    let len = pdu.len() as u16;
    let mut frame = vec![0, 0, 0, 0, (len >> 8) as u8, (len & 0xFF) as u8];
    frame.extend_from_slice(pdu);
    frame
}

#[tokio::test]
async fn reads_three_registers_across_three_polls() {
    let frames = (10u16..13)
        .map(|v| Ok(tcp_frame(&[0x01, 0x03, 0x02, (v >> 8) as u8, (v & 0xFF) as u8])))
        .collect();
    let transport = ScriptedTransport::new(frames);
    let request = base_request(3, 1, Some(3));
    let cancel = Cancel::new();
    let mut observer = RecordingObserver::default();

    let outcome = run(transport, &request, &mut observer, &cancel).await;

    assert_eq!(outcome, Ok(vec![Value::UInt(12)]));
    assert_eq!(observer.rows.len(), 3);
    assert_eq!(observer.rows[0].values, vec![Value::UInt(10)]);
    assert_eq!(observer.rows[2].values, vec![Value::UInt(12)]);
}

#[tokio::test]
async fn modbus_exception_is_retryable_not_fatal() {
    let transport = ScriptedTransport::new(vec![
        Ok(tcp_frame(&[0x01, 0x83, 0x02])),
        Ok(tcp_frame(&[0x01, 0x03, 0x02, 0x00, 0x05])),
    ]);
    let request = base_request(3, 1, Some(2));
    let cancel = Cancel::new();
    let mut observer = RecordingObserver::default();

    let outcome = run(transport, &request, &mut observer, &cancel).await;

    assert_eq!(outcome, Ok(vec![Value::UInt(5)]));
    assert_eq!(observer.errors.len(), 1);
    assert_eq!(observer.errors[0].code, 2);
}

#[tokio::test]
async fn unbounded_poll_stops_on_cancel_and_returns_last_value() {
    let transport = ScriptedTransport::new(vec![
        Ok(tcp_frame(&[0x01, 0x03, 0x02, 0x00, 0x07])),
        Ok(tcp_frame(&[0x01, 0x03, 0x02, 0x00, 0x08])),
    ]);
    let mut request = base_request(3, 1, None);
    request.poll_delay_ms = 5;
    let cancel = Cancel::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });
    let mut observer = NullObserver;

    let outcome = run(transport, &request, &mut observer, &cancel).await;

    assert_eq!(outcome, Ok(vec![Value::UInt(8)]));
}

#[tokio::test]
async fn bounded_cancellation_before_first_poll_is_error_107() {
    let transport = ScriptedTransport::new(vec![]);
    let request = base_request(3, 1, Some(5));
    let cancel = Cancel::new();
    cancel.cancel();
    let mut observer = NullObserver;

    let outcome = run(transport, &request, &mut observer, &cancel).await;

    assert_eq!(outcome, Err(ModbusError::UserCancelled.into_record()));
}
