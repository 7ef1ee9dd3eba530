//! A lock-free single-producer/single-consumer byte-record queue hosted in a
//! POSIX shared-memory segment.
//!
//! One side of the pair calls [`Queue::reserve`]/[`Queue::produce`], the
//! other calls [`Queue::peek`]/[`Queue::consume`]; the two can live in
//! different processes entirely, communicating only through the mapped
//! region. [`attach`] handles opening, optionally creating, and mapping the
//! named segment; [`Queue::new`] builds the queue handle over an already
//! mapped region for callers that manage their own mapping.
//!
//! ```no_run
//! use spscshm_rs::{attach, ShmConfig};
//!
//! let config = ShmConfig::new("/example_queue", 1 << 16, true);
//! let (queue, _mapping) = attach(&config)?;
//! queue.produce(b"hello")?;
//! let mut buf = [0u8; 64];
//! let n = queue.consume(&mut buf)?;
//! assert_eq!(&buf[..n as usize], b"hello");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod backoff;
mod config;
mod consumer;
mod error;
mod invariants;
mod layout;
mod metrics;
mod producer;
mod queue;
mod shm;

pub use backoff::Backoff;
pub use config::ShmConfig;
pub use consumer::Peeked;
pub use error::{ConsumeError, NewQueueError, ProduceError};
pub use layout::{is_power_of_two, round_power_of_two, MIN_CAPACITY};
pub use metrics::{Metrics, MetricsSnapshot};
pub use producer::Reservation;
pub use queue::Queue;
pub use shm::Mapping;

/// Opens (creating if requested and absent) and maps the shared-memory
/// segment named by `config.name`, and builds a [`Queue`] handle over it.
///
/// The returned [`Mapping`] must outlive the returned `Queue`; keep both in
/// scope for as long as this process needs to produce or consume records.
/// Dropping the `Mapping` unmaps the segment but does not unlink its name —
/// call [`unlink`] explicitly once no process needs the segment anymore.
///
/// # Errors
///
/// See [`NewQueueError`] for the individual failure modes.
pub fn attach(config: &ShmConfig) -> Result<(Queue, Mapping), NewQueueError> {
    let data_capacity = layout::round_power_of_two(config.capacity);
    let mapping = shm::attach(config, data_capacity)?;
    // SAFETY: `mapping` maps at least `HEADER_LEN + data_capacity` bytes —
    // and, for a pre-existing segment, at least its real on-disk size, which
    // `Queue::new` trusts over `data_capacity` when `first_time` is false —
    // and outlives the `Queue` we build over it for as long as the caller
    // keeps both alive, which the doc comment above requires.
    let queue = unsafe {
        Queue::new(
            mapping.base(),
            data_capacity,
            mapping.first_time(),
            config.enable_metrics,
        )?
    };
    Ok((queue, mapping))
}

/// Removes the named shared-memory object so no future [`attach`] can open
/// it. Existing mappings remain valid until unmapped.
///
/// # Errors
///
/// Returns the underlying I/O error if the unlink syscall fails.
pub fn unlink(name: &str) -> std::io::Result<()> {
    shm::unlink(name)
}
