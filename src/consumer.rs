//! Consumer path (component C): two-phase peek + commit-consume of a record,
//! transparently skipping wrap sentinels planted by the producer.

use std::sync::atomic::Ordering;

use crate::error::ConsumeError;
use crate::invariants::{debug_assert_index_in_range, debug_assert_len_within_half_capacity};
use crate::layout::{atomic_u32_at, ITEM_HEADER_LEN, MIN_TAIL_SLACK};
use crate::queue::Queue;

impl Queue {
    /// Looks at the next unread record without consuming it.
    ///
    /// Read the payload out of [`Peeked::as_slice`] and call
    /// [`Peeked::commit`] to advance past it, or drop the `Peeked` to leave
    /// it for the next call.
    ///
    /// # Errors
    ///
    /// - [`ConsumeError::QueueEmpty`] if `consumer_index == producer_index`;
    ///   transient, the caller may retry later.
    /// - [`ConsumeError::HeadOutOfRange`] if the decoded length word is
    ///   inconsistent with the region layout — a protocol violation, or a
    ///   second writer stepping on the single-producer contract.
    pub fn peek(&self) -> Result<Peeked<'_>, ConsumeError> {
        let header = self.header();
        let mask = self.mask();
        loop {
            let head = header.consumer_index.load(Ordering::SeqCst);
            let tail = header.producer_index.load(Ordering::SeqCst);
            debug_assert_index_in_range!("consumer_index", head, self.capacity());
            debug_assert_index_in_range!("producer_index", tail, self.capacity());
            if head == tail {
                return Err(ConsumeError::QueueEmpty);
            }

            if head + MIN_TAIL_SLACK > mask {
                self.skip_wrap(header, head, tail);
                continue;
            }

            let pad = head & 3;
            // SAFETY: `head + pad` is 4-byte aligned and, by the slack check
            // above, `head + pad + 4 <= mask + 1`.
            let len_word = unsafe { atomic_u32_at(self.data_ptr().add((head + pad) as usize)) };
            let item_len = len_word.load(Ordering::SeqCst);

            if item_len == 0 {
                self.skip_wrap(header, head, tail);
                continue;
            }
            debug_assert_len_within_half_capacity!(item_len, self.capacity());

            let new_head = head + pad + ITEM_HEADER_LEN + u64::from(item_len);
            if tail < head {
                if head + MIN_TAIL_SLACK + u64::from(item_len) > self.len() {
                    return Err(ConsumeError::HeadOutOfRange);
                }
            } else if new_head > tail {
                return Err(ConsumeError::HeadOutOfRange);
            }

            // SAFETY: bounds just checked above.
            let payload_ptr =
                unsafe { self.data_ptr().add((head + pad + ITEM_HEADER_LEN) as usize) };

            return Ok(Peeked {
                queue: self,
                payload_ptr,
                len: item_len,
                new_head,
            });
        }
    }

    /// Advances `consumer_index` past an unusable end-of-buffer sliver: to
    /// `tail` if the producer is still writing within the same lap (nothing
    /// more to read before catching up), otherwise to `0`.
    fn skip_wrap(&self, header: &crate::layout::RegionHeader, head: u64, tail: u64) {
        let target = if tail > head { tail } else { 0 };
        let _ = header.consumer_index.compare_exchange(
            head,
            target,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Publishes `new_head` as the consumer's progress.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumeError::CommitConsumeFail`] if `consumer_index`
    /// changed concurrently between `peek` and `commit_consume` — under the
    /// single-consumer contract this only happens through caller misuse.
    pub fn commit_consume(&self, new_head: u64) -> Result<(), ConsumeError> {
        let header = self.header();
        let head = header.consumer_index.load(Ordering::SeqCst);
        header
            .consumer_index
            .compare_exchange(head, new_head, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| ConsumeError::CommitConsumeFail)
    }

    /// Convenience wrapper: peek the next record, copy it into `dst`, commit.
    ///
    /// Returns the number of bytes written to `dst`.
    ///
    /// # Errors
    ///
    /// - [`ConsumeError::QueueEmpty`] if the queue is currently empty.
    /// - [`ConsumeError::OutBufferTooSmall`] without advancing past the
    ///   record, so the caller may retry with a larger buffer.
    pub fn consume(&self, dst: &mut [u8]) -> Result<u32, ConsumeError> {
        let peeked = self.peek()?;
        let len = peeked.len();
        if dst.len() < len as usize {
            return Err(ConsumeError::OutBufferTooSmall {
                cap: dst.len() as u32,
                len,
            });
        }
        dst[..len as usize].copy_from_slice(peeked.as_slice());
        peeked.commit()?;
        Ok(len)
    }
}

/// A zero-copy handle to the next unread record.
///
/// Read the payload out of [`Self::as_slice`], then call [`Self::commit`] to
/// advance the consumer index past it. Dropping a `Peeked` without
/// committing simply leaves the record for the next [`Queue::peek`] call —
/// nothing is consumed until commit.
pub struct Peeked<'a> {
    queue: &'a Queue,
    payload_ptr: *mut u8,
    len: u32,
    new_head: u64,
}

impl<'a> Peeked<'a> {
    /// Returns the unread payload.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `payload_ptr` was derived in `Queue::peek` from a range
        // validated to lie within the mapped data area, and no writer may
        // touch bytes behind `consumer_index` (single-producer contract).
        unsafe { std::slice::from_raw_parts(self.payload_ptr, self.len as usize) }
    }

    /// Length of the record, in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` if the record has zero length. Never true in practice —
    /// the producer side rejects zero-length reservations — provided for API
    /// symmetry with [`crate::producer::Reservation`].
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Advances the consumer index past this record.
    pub fn commit(self) -> Result<(), ConsumeError> {
        self.queue.commit_consume(self.new_head)?;
        if let Some(m) = self.queue.metrics_if_enabled() {
            m.record_consume(self.len);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::layout::HEADER_LEN;
    use crate::queue::Queue;

    fn fresh_queue(capacity: u64) -> (Vec<u8>, Queue) {
        let total = (HEADER_LEN + capacity) as usize;
        let mut region = vec![0u8; total];
        let queue = unsafe { Queue::new(region.as_mut_ptr(), capacity, true, false).unwrap() };
        (region, queue)
    }

    #[test]
    fn empty_after_init() {
        let (_region, q) = fresh_queue(4096);
        assert!(matches!(q.peek(), Err(crate::error::ConsumeError::QueueEmpty)));
    }

    #[test]
    fn echo_round_trip() {
        let (_region, q) = fresh_queue(4096);
        q.produce(b"hello, queue").unwrap();
        let mut buf = [0u8; 64];
        let n = q.consume(&mut buf).unwrap();
        assert_eq!(&buf[..n as usize], b"hello, queue");
        assert!(matches!(q.peek(), Err(crate::error::ConsumeError::QueueEmpty)));
    }

    #[test]
    fn small_destination_buffer_does_not_advance() {
        let (_region, q) = fresh_queue(4096);
        q.produce(b"0123456789").unwrap();
        let mut tiny = [0u8; 4];
        let err = q.consume(&mut tiny).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ConsumeError::OutBufferTooSmall { cap: 4, len: 10 }
        ));
        // Record is still there for a retry with a bigger buffer.
        let mut buf = [0u8; 16];
        let n = q.consume(&mut buf).unwrap();
        assert_eq!(&buf[..n as usize], b"0123456789");
    }

    #[test]
    fn fifo_ordering_across_multiple_records() {
        let (_region, q) = fresh_queue(4096);
        q.produce(b"first").unwrap();
        q.produce(b"second").unwrap();
        q.produce(b"third").unwrap();

        let mut buf = [0u8; 32];
        for expected in [&b"first"[..], &b"second"[..], &b"third"[..]] {
            let n = q.consume(&mut buf).unwrap();
            assert_eq!(&buf[..n as usize], expected);
        }
        assert!(matches!(q.peek(), Err(crate::error::ConsumeError::QueueEmpty)));
    }

    #[test]
    fn wrap_sentinel_is_skipped_transparently() {
        let (_region, q) = fresh_queue(4096);
        let mask = q.len() - 1;
        let tail = mask - 4;
        q.header()
            .consumer_index
            .store(tail, std::sync::atomic::Ordering::SeqCst);
        q.header()
            .producer_index
            .store(tail, std::sync::atomic::Ordering::SeqCst);

        q.produce(b"past the wrap").unwrap();

        let mut buf = [0u8; 32];
        let n = q.consume(&mut buf).unwrap();
        assert_eq!(&buf[..n as usize], b"past the wrap");
    }
}
