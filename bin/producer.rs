//! Demonstration producer process.
//!
//! Run with: `cargo run --bin spscshm-producer -- /demo_queue "hello, queue"`
//!
//! Creates the named shared-memory segment if it does not already exist,
//! writes one record, and prints the queue's metrics before exiting. Pair it
//! with `spscshm-consumer` reading the same segment name from another
//! terminal.

use std::env;
use std::process::ExitCode;

use spscshm_rs::{attach, ShmConfig};

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(name) = args.next() else {
        eprintln!("usage: spscshm-producer <segment-name> [message]");
        return ExitCode::FAILURE;
    };
    let message = args.next().unwrap_or_else(|| "hello, queue".to_string());

    println!("=== spscshm producer ===");
    println!("segment: {name}");

    let config = ShmConfig::new(name, 1 << 16, true).with_metrics(true);
    let (queue, _mapping) = match attach(&config) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("failed to attach: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = queue.produce(message.as_bytes()) {
        eprintln!("failed to produce: {err}");
        return ExitCode::FAILURE;
    }
    println!("produced {} bytes: {message:?}", message.len());

    let snapshot = queue.metrics();
    println!(
        "metrics: records_produced={} bytes_produced={} wrap_events={} reserve_retries={}",
        snapshot.records_produced,
        snapshot.bytes_produced,
        snapshot.wrap_events,
        snapshot.reserve_retries
    );

    ExitCode::SUCCESS
}
