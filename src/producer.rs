//! Producer path (component B): two-phase reserve + commit of a record, and
//! the wrap-around policy that keeps variable-length records safe across the
//! end of the data area.

use std::sync::atomic::Ordering;

use crate::error::ProduceError;
use crate::invariants::{
    debug_assert_index_in_range, debug_assert_item_in_bounds, debug_assert_length_word_published,
};
use crate::layout::{atomic_u32_at, ITEM_HEADER_LEN, MIN_TAIL_SLACK};
use crate::queue::Queue;

impl Queue {
    /// Reserves space for a `need_bytes`-byte record without publishing it.
    ///
    /// On success, write the payload into [`Reservation::as_mut_slice`] and
    /// call [`Reservation::commit`]. The region is unchanged until commit.
    ///
    /// # Errors
    ///
    /// - [`ProduceError::BadParamAlloc`] if `need_bytes == 0`.
    /// - [`ProduceError::BytesTooLarge`] if `need_bytes > mask / 2`.
    /// - [`ProduceError::NotEnoughSpace`] if the ring cannot fit the record
    ///   right now; transient, the caller may retry later.
    pub fn reserve(&self, need_bytes: u32) -> Result<Reservation<'_>, ProduceError> {
        if need_bytes == 0 {
            return Err(ProduceError::BadParamAlloc);
        }
        let mask = self.mask();
        let limit = mask / 2;
        if u64::from(need_bytes) > limit {
            return Err(ProduceError::BytesTooLarge { need: u64::from(need_bytes), limit });
        }

        let header = self.header();
        loop {
            let head = header.consumer_index.load(Ordering::SeqCst);
            let tail = header.producer_index.load(Ordering::SeqCst);
            debug_assert_index_in_range!("consumer_index", head, self.capacity());
            debug_assert_index_in_range!("producer_index", tail, self.capacity());
            let pad = tail & 3;

            if tail >= head {
                if tail + MIN_TAIL_SLACK > mask {
                    if head == 0 {
                        return Err(ProduceError::NotEnoughSpace);
                    }
                    let _ = header.producer_index.compare_exchange(
                        tail,
                        0,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    );
                    self.bump_retry();
                    continue;
                }
                if tail + MIN_TAIL_SLACK + u64::from(need_bytes) > mask {
                    if head == 0 {
                        return Err(ProduceError::NotEnoughSpace);
                    }
                    self.write_wrap_sentinel_and_reset(header, tail, pad);
                    continue;
                }
            } else if tail + MIN_TAIL_SLACK + u64::from(need_bytes) + 1 > head {
                return Err(ProduceError::NotEnoughSpace);
            }

            let header_offset = tail + pad;
            let new_tail = header_offset + ITEM_HEADER_LEN + u64::from(need_bytes);

            // SAFETY: header_offset is 4-byte aligned (tail + (tail & 3)) and,
            // by the space checks above, header_offset + 4 <= mask + 1.
            let len_word = unsafe { atomic_u32_at(self.data_ptr().add(header_offset as usize)) };
            let old = len_word.load(Ordering::SeqCst);
            if len_word
                .compare_exchange(old, need_bytes, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                self.bump_retry();
                continue;
            }
            debug_assert_length_word_published!(need_bytes);
            debug_assert_item_in_bounds!(
                header_offset,
                ITEM_HEADER_LEN + u64::from(need_bytes),
                self.capacity()
            );

            // SAFETY: payload fits within the data area (checked above) and
            // does not alias any byte range the consumer may currently read
            // (that range ends at `tail`, strictly before `header_offset`).
            let payload_ptr =
                unsafe { self.data_ptr().add((header_offset + ITEM_HEADER_LEN) as usize) };

            return Ok(Reservation {
                queue: self,
                payload_ptr,
                len: need_bytes,
                new_tail,
            });
        }
    }

    /// Publishes a wrap sentinel at `tail + pad` and resets `producer_index`
    /// to `0`, rolling the sentinel back if the index reset loses a race.
    fn write_wrap_sentinel_and_reset(&self, header: &crate::layout::RegionHeader, tail: u64, pad: u64) {
        let sentinel_offset = tail + pad;
        // SAFETY: sentinel_offset is 4-byte aligned and `tail + MIN_TAIL_SLACK
        // <= mask` was just checked by the caller, so this write fits.
        let len_word = unsafe { atomic_u32_at(self.data_ptr().add(sentinel_offset as usize)) };
        let old = len_word.load(Ordering::SeqCst);
        if len_word.compare_exchange(old, 0, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            self.bump_retry();
            return;
        }
        if header
            .producer_index
            .compare_exchange(tail, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Defensive: under the single-producer contract this CAS cannot
            // actually fail. Best-effort roll the sentinel back so a retry
            // sees the original length word rather than a stray zero.
            let _ = len_word.compare_exchange(0, old, Ordering::SeqCst, Ordering::SeqCst);
            return;
        }
        self.bump_wrap();
    }

    /// Publishes `new_tail` as the producer's progress.
    ///
    /// # Errors
    ///
    /// Returns [`ProduceError::CommitFail`] if `producer_index` changed
    /// concurrently between `reserve` and `commit_produce` — under the
    /// single-producer contract this only happens through caller misuse.
    pub fn commit_produce(&self, new_tail: u64) -> Result<(), ProduceError> {
        let header = self.header();
        let tail = header.producer_index.load(Ordering::SeqCst);
        header
            .producer_index
            .compare_exchange(tail, new_tail, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| ProduceError::CommitFail)
    }

    /// Convenience wrapper: reserve, copy `src` into the returned region, commit.
    pub fn produce(&self, src: &[u8]) -> Result<(), ProduceError> {
        let len = u32::try_from(src.len()).map_err(|_| ProduceError::BytesTooLarge {
            need: src.len() as u64,
            limit: self.mask() / 2,
        })?;
        let mut reservation = self.reserve(len)?;
        reservation.as_mut_slice().copy_from_slice(src);
        reservation.commit()
    }

    fn bump_retry(&self) {
        if let Some(m) = self.metrics_if_enabled() {
            m.record_retry();
        }
    }

    fn bump_wrap(&self) {
        if let Some(m) = self.metrics_if_enabled() {
            m.record_wrap();
        }
    }
}

/// A zero-copy handle to a reserved, not-yet-published record.
///
/// Write the payload into [`Self::as_mut_slice`] then call [`Self::commit`].
/// The slice aliases shared memory the consumer process may read only after
/// commit; nothing prevents the producer from reading it back before then,
/// but no other writer may touch it.
pub struct Reservation<'a> {
    queue: &'a Queue,
    payload_ptr: *mut u8,
    len: u32,
    new_tail: u64,
}

impl<'a> Reservation<'a> {
    /// Returns the reserved payload region for writing.
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: `payload_ptr` was derived in `Queue::reserve` from a range
        // validated to lie within the mapped data area, and this
        // `Reservation` is the only handle that can write to it before
        // commit (single-producer contract).
        unsafe { std::slice::from_raw_parts_mut(self.payload_ptr, self.len as usize) }
    }

    /// Number of bytes reserved.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` if the reservation has zero length. Never true in
    /// practice — `reserve` rejects zero-length requests — provided for API
    /// symmetry with [`crate::consumer::Peeked`].
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Publishes the record, making it visible to the consumer.
    pub fn commit(self) -> Result<(), ProduceError> {
        self.queue.commit_produce(self.new_tail)?;
        if let Some(m) = self.queue.metrics_if_enabled() {
            m.record_produce(self.len);
        }
        Ok(())
    }
}
