//! The shared-memory SPSC byte-record queue itself: region construction and
//! the pure sizing/status predicates of component A. The reserve/commit and
//! peek/commit-consume protocols live in [`crate::producer`] and
//! [`crate::consumer`].

use std::sync::atomic::Ordering;

use crate::error::NewQueueError;
use crate::invariants::debug_assert_power_of_two_capacity;
use crate::layout::{is_power_of_two, RegionHeader, HEADER_LEN};
use crate::metrics::Metrics;

/// A handle to one side (or both sides, within a single process) of an SPSC
/// byte-record queue hosted in a shared-memory segment.
///
/// `Queue` borrows its region through a raw base pointer; it does not own the
/// mapping. Pair it with the [`crate::shm::Mapping`] returned by
/// [`crate::attach`] (or your own mapping, via the `unsafe` [`Queue::new`])
/// and keep that mapping alive for as long as the `Queue` is used — dropping
/// the mapping unmaps the region. Unlinking the underlying shared memory
/// object's name is a separate, explicit operation (see [`crate::unlink`])
/// left to whichever process controls the segment's lifetime.
///
/// Only the producer process should call the methods in [`crate::producer`]
/// and only the consumer process should call the methods in
/// [`crate::consumer`]; nothing in the type system enforces this split since
/// the two sides genuinely live in different address spaces. This mirrors
/// the C queue this protocol was ported from, where a single `SpscQueue*` is
/// likewise shared between both roles by convention.
pub struct Queue {
    base: *mut u8,
    capacity: u64,
    metrics: Metrics,
    enable_metrics: bool,
}

// SAFETY: all shared mutable state is reached exclusively through the atomic
// fields of `RegionHeader` and through the single-writer discipline on the
// data area documented in the protocol's concurrency model. The raw pointer
// itself carries no thread-local state.
unsafe impl Send for Queue {}
unsafe impl Sync for Queue {}

impl Queue {
    /// Builds a `Queue` over an already-mapped region.
    ///
    /// `base` must point to a mapping of exactly `capacity_hint.max(existing
    /// capacity) + HEADER_LEN` bytes that outlives the returned `Queue` (the
    /// glue in [`crate::shm`] guarantees this). `first_time` must be `true`
    /// iff the caller freshly created and zero-filled the segment.
    ///
    /// # Errors
    ///
    /// Returns [`NewQueueError::BadParam`] if `first_time` is `true` and
    /// `capacity_hint` is not a power of two.
    ///
    /// # Safety
    ///
    /// `base` must be a valid, exclusive-to-this-call pointer to a mapping of
    /// at least `HEADER_LEN + capacity_hint` bytes, suitably aligned for
    /// [`RegionHeader`] (any page-aligned mapping qualifies).
    pub unsafe fn new(
        base: *mut u8,
        capacity_hint: u64,
        first_time: bool,
        enable_metrics: bool,
    ) -> Result<Self, NewQueueError> {
        if first_time {
            if !is_power_of_two(capacity_hint) {
                return Err(NewQueueError::BadParam(capacity_hint));
            }
            let header = &*base.cast::<RegionHeader>();
            header.producer_index.store(0, Ordering::SeqCst);
            header.consumer_index.store(0, Ordering::SeqCst);
            header.mask.store(capacity_hint - 1, Ordering::SeqCst);
        }

        // On a non-first-time attach, trust the on-disk mask over whatever
        // capacity the caller asked for.
        let header = &*base.cast::<RegionHeader>();
        let mask = header.mask.load(Ordering::SeqCst);
        debug_assert_power_of_two_capacity!(mask);

        Ok(Self {
            base,
            capacity: mask + 1,
            metrics: Metrics::new(),
            enable_metrics,
        })
    }

    #[inline]
    pub(crate) fn header(&self) -> &RegionHeader {
        // SAFETY: `base` was validated to point at a mapping of at least
        // HEADER_LEN bytes in `new`, and the header is never unmapped while
        // `self` is alive.
        unsafe { &*self.base.cast::<RegionHeader>() }
    }

    #[inline]
    pub(crate) fn data_ptr(&self) -> *mut u8 {
        // SAFETY: the mapping backing `base` is at least `HEADER_LEN +
        // self.capacity` bytes (guaranteed by the caller of `new`).
        unsafe { self.base.add(HEADER_LEN as usize) }
    }

    #[inline]
    pub(crate) fn mask(&self) -> u64 {
        self.capacity - 1
    }

    #[inline]
    pub(crate) fn capacity(&self) -> u64 {
        self.capacity
    }

    #[inline]
    pub(crate) fn metrics_if_enabled(&self) -> Option<&Metrics> {
        self.enable_metrics.then_some(&self.metrics)
    }

    /// Returns a snapshot of this handle's local metrics. Returns the
    /// all-zero snapshot if metrics were not enabled for this handle.
    pub fn metrics(&self) -> crate::metrics::MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Total number of bytes in the data area (`mask + 1`).
    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.capacity
    }

    /// Returns `true` iff `producer_index == consumer_index`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let header = self.header();
        header.consumer_index.load(Ordering::SeqCst) == header.producer_index.load(Ordering::SeqCst)
    }

    /// Returns `true` iff `(producer_index + 1) & mask == consumer_index`.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        let header = self.header();
        let tail = header.producer_index.load(Ordering::SeqCst);
        let head = header.consumer_index.load(Ordering::SeqCst);
        (tail.wrapping_add(1) & self.mask()) == head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_queue(capacity: u64) -> (Vec<u8>, Queue) {
        let total = (HEADER_LEN + capacity) as usize;
        let mut region = vec![0u8; total];
        let queue = unsafe { Queue::new(region.as_mut_ptr(), capacity, true, false).unwrap() };
        (region, queue)
    }

    #[test]
    fn fresh_queue_is_empty_not_full() {
        let (_region, q) = fresh_queue(4096);
        assert!(q.is_empty());
        assert!(!q.is_full());
        assert_eq!(q.len(), 4096);
    }

    #[test]
    fn rejects_non_power_of_two_capacity() {
        let mut region = vec![0u8; (HEADER_LEN + 1000) as usize];
        let err = unsafe { Queue::new(region.as_mut_ptr(), 1000, true, false).unwrap_err() };
        assert!(matches!(err, NewQueueError::BadParam(1000)));
    }

    #[test]
    fn forced_full_state() {
        let (_region, q) = fresh_queue(4096);
        q.header().consumer_index.store(2, Ordering::SeqCst);
        q.header().producer_index.store(1, Ordering::SeqCst);
        assert!(q.is_full());
    }

    #[test]
    fn non_first_time_attach_trusts_stored_mask() {
        let total = (HEADER_LEN + 4096) as usize;
        let mut region = vec![0u8; total];
        {
            let _q = unsafe { Queue::new(region.as_mut_ptr(), 4096, true, false).unwrap() };
        }
        // Re-attach with a different (bogus) capacity hint; the on-disk mask wins.
        let q2 = unsafe { Queue::new(region.as_mut_ptr(), 99, false, false).unwrap() };
        assert_eq!(q2.len(), 4096);
    }
}
