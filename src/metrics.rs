use std::sync::atomic::{AtomicU64, Ordering};

/// Optional counters for monitoring queue activity.
///
/// Cheap to keep around even when unused: each field is a single relaxed
/// atomic increment on the hot path, and the whole struct is skipped entirely
/// when [`crate::config::ShmConfig::enable_metrics`] is `false`.
#[derive(Debug, Default)]
pub struct Metrics {
    records_produced: AtomicU64,
    records_consumed: AtomicU64,
    bytes_produced: AtomicU64,
    bytes_consumed: AtomicU64,
    wrap_events: AtomicU64,
    reserve_retries: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_produce(&self, bytes: u32) {
        self.records_produced.fetch_add(1, Ordering::Relaxed);
        self.bytes_produced.fetch_add(u64::from(bytes), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_consume(&self, bytes: u32) {
        self.records_consumed.fetch_add(1, Ordering::Relaxed);
        self.bytes_consumed.fetch_add(u64::from(bytes), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_wrap(&self) {
        self.wrap_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_retry(&self) {
        self.reserve_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_produced: self.records_produced.load(Ordering::Relaxed),
            records_consumed: self.records_consumed.load(Ordering::Relaxed),
            bytes_produced: self.bytes_produced.load(Ordering::Relaxed),
            bytes_consumed: self.bytes_consumed.load(Ordering::Relaxed),
            wrap_events: self.wrap_events.load(Ordering::Relaxed),
            reserve_retries: self.reserve_retries.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`Metrics`], safe to print or serialize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_produced: u64,
    pub records_consumed: u64,
    pub bytes_produced: u64,
    pub bytes_consumed: u64,
    pub wrap_events: u64,
    pub reserve_retries: u64,
}
