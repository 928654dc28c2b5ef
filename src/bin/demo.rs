//! mbpoll demo
//!
//! Polls a single register range from a Modbus TCP device once and prints
//! the decoded values, or the error record if the poll failed.
//!
//! Usage: cargo run --bin demo [host] [device_id] [start_register] [count]

use mbpoll::engine::{poll, Cancel};
use mbpoll::protocol::{PollRequest, RawPollRequest};
use mbpoll::utils::NullObserver;

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let device_id: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let start_register: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let num_vals: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(10);

    let request = match PollRequest::build(RawPollRequest {
        target_spec: host.clone(),
        tcp_port: 502,
        device_id,
        function: 3,
        start_register,
        num_vals,
        write_value: None,
        data_type: "uint16".to_string(),
        byte_swap: false,
        word_swap: false,
        zero_based: false,
        raw_bytes: false,
        timeout_ms: 2000,
        poll_count: 1,
        poll_delay_ms: 1000,
        csv_path: None,
        gpio_pin: None,
    }) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("invalid request: {}", err.into_record());
            std::process::exit(1);
        }
    };

    println!("polling {host} device {device_id} registers {start_register}..{}", start_register + num_vals);

    let mut observer = NullObserver;
    let cancel = Cancel::new();
    match poll(&request, &mut observer, &cancel).await {
        Ok(values) => println!("{values:?}"),
        Err(record) => {
            println!("{record}");
            std::process::exit(1);
        }
    }
}
