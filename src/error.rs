use thiserror::Error;

/// Errors raised while attaching or initialising a shared-memory queue.
#[derive(Debug, Error)]
pub enum NewQueueError {
    /// The requested capacity is not a power of two.
    #[error("capacity must be a power of two (got {0})")]
    BadParam(u64),
    /// The segment name contains an interior nul byte and cannot be passed to `shm_open`.
    #[error("segment name contains an interior nul byte")]
    InvalidName,
    /// `shm_open` failed for a reason other than the segment not existing.
    #[error("shm_open failed: {0}")]
    ShmOpen(#[source] std::io::Error),
    /// The segment does not exist and the caller did not ask to create it.
    #[error("shared memory segment does not exist")]
    ShmNotExists,
    /// `shm_open(O_CREAT)` failed while creating a new segment.
    #[error("failed to create shared memory segment: {0}")]
    ShmCreateFail(#[source] std::io::Error),
    /// `ftruncate` failed while sizing a freshly created segment.
    #[error("ftruncate failed: {0}")]
    ShmTruncate(#[source] std::io::Error),
    /// `mmap` failed.
    #[error("mmap failed: {0}")]
    Mmap(#[source] std::io::Error),
}

/// Errors raised by [`crate::producer::Producer::reserve`] and
/// [`crate::producer::Producer::produce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProduceError {
    /// `need_bytes` exceeds `mask / 2`.
    #[error("record of {need} bytes exceeds half the ring capacity ({limit})")]
    BytesTooLarge {
        /// The requested payload size.
        need: u64,
        /// `mask / 2`, the largest payload this ring will ever accept.
        limit: u64,
    },
    /// `need_bytes` was zero.
    #[error("cannot reserve a zero-length record")]
    BadParamAlloc,
    /// The ring cannot accept a record of this size right now; transient, retry later.
    #[error("not enough space in the ring right now")]
    NotEnoughSpace,
    /// `CommitProduce`'s CAS on `producer_index` failed — another writer touched the index.
    #[error("commit failed: producer_index changed concurrently")]
    CommitFail,
}

/// Errors raised by [`crate::consumer::Consumer::peek`] and
/// [`crate::consumer::Consumer::consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConsumeError {
    /// `consumer_index == producer_index`; nothing to read right now.
    #[error("queue is empty")]
    QueueEmpty,
    /// The decoded item length is inconsistent with the observed tail: protocol
    /// violation or a corrupted region.
    #[error("head is out of range: region may be corrupted or misused by a second peer")]
    HeadOutOfRange,
    /// The caller's destination buffer is smaller than the record; the record is
    /// left uncommitted so the caller can retry with a larger buffer.
    #[error("destination buffer of {cap} bytes is too small for a {len}-byte record")]
    OutBufferTooSmall {
        /// Caller-supplied buffer capacity.
        cap: u32,
        /// Actual record length.
        len: u32,
    },
    /// `CommitConsume`'s CAS on `consumer_index` failed — another reader touched the index.
    #[error("commit failed: consumer_index changed concurrently")]
    CommitConsumeFail,
}
