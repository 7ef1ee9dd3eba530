//! Demonstration consumer process.
//!
//! Run with: `cargo run --bin spscshm-consumer -- /demo_queue`
//!
//! Attaches to an already-created shared-memory segment and polls it for one
//! record, backing off between empty reads. Pair it with
//! `spscshm-producer` writing to the same segment name from another
//! terminal.

use std::env;
use std::process::ExitCode;

use spscshm_rs::{attach, Backoff, ConsumeError, ShmConfig};

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(name) = args.next() else {
        eprintln!("usage: spscshm-consumer <segment-name>");
        return ExitCode::FAILURE;
    };

    println!("=== spscshm consumer ===");
    println!("segment: {name}");

    let config = ShmConfig::new(name, 1 << 16, false).with_metrics(true);
    let (queue, _mapping) = match attach(&config) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("failed to attach: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut buf = [0u8; 4096];
    let mut backoff = Backoff::new();
    loop {
        match queue.consume(&mut buf) {
            Ok(len) => {
                let payload = String::from_utf8_lossy(&buf[..len as usize]);
                println!("consumed {len} bytes: {payload:?}");
                break;
            }
            Err(ConsumeError::QueueEmpty) => {
                if backoff.is_completed() {
                    eprintln!("queue stayed empty, giving up");
                    return ExitCode::FAILURE;
                }
                backoff.snooze();
            }
            Err(err) => {
                eprintln!("failed to consume: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let snapshot = queue.metrics();
    println!(
        "metrics: records_consumed={} bytes_consumed={}",
        snapshot.records_consumed, snapshot.bytes_consumed
    );

    ExitCode::SUCCESS
}
