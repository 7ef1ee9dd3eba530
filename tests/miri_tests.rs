//! Miri-compatible tests exercising the unsafe raw-pointer paths of `Queue`.
//!
//! Run with: `cargo +nightly miri test --test miri_tests`
//!
//! `Queue::reserve`/`peek` hand back raw pointers into a region they don't
//! own, and `Queue::new` is built from a caller-supplied base pointer — both
//! are exactly the kind of aliasing/init footguns Miri is good at catching.
//! These tests exercise them over a heap-allocated region rather than a real
//! `mmap`, since Miri has no POSIX shared-memory support.

use spscshm_rs::{ConsumeError, Queue};

fn fake_queue(capacity: u64) -> (Vec<u8>, Queue) {
    let total = (4096 + capacity) as usize;
    let mut region = vec![0u8; total];
    let queue = unsafe { Queue::new(region.as_mut_ptr(), capacity, true, false).unwrap() };
    (region, queue)
}

#[test]
fn miri_reserve_commit_round_trip() {
    let (_region, queue) = fake_queue(4096);
    let mut reservation = queue.reserve(11).unwrap();
    reservation.as_mut_slice().copy_from_slice(b"it's a test");
    reservation.commit().unwrap();

    let peeked = queue.peek().unwrap();
    assert_eq!(peeked.as_slice(), b"it's a test");
    peeked.commit().unwrap();
}

#[test]
fn miri_reservation_dropped_without_commit_is_not_observable() {
    let (_region, queue) = fake_queue(4096);
    {
        let mut reservation = queue.reserve(8).unwrap();
        reservation.as_mut_slice().fill(0xAB);
    }
    assert!(matches!(queue.peek(), Err(ConsumeError::QueueEmpty)));
}

#[test]
fn miri_peeked_dropped_without_commit_leaves_record_for_retry() {
    let (_region, queue) = fake_queue(4096);
    queue.produce(b"leave me").unwrap();
    {
        let peeked = queue.peek().unwrap();
        assert_eq!(peeked.as_slice(), b"leave me");
    }
    let peeked_again = queue.peek().unwrap();
    assert_eq!(peeked_again.as_slice(), b"leave me");
}

#[test]
fn miri_many_small_records_exercise_wrap() {
    let (_region, queue) = fake_queue(1024);
    let mut dst = [0u8; 64];
    let mut next_expected = 0u32;
    for i in 0..500u32 {
        let payload = i.to_le_bytes();
        while queue.produce(&payload).is_err() {
            let n = queue.consume(&mut dst).unwrap();
            let got = u32::from_le_bytes(dst[..n as usize].try_into().unwrap());
            assert_eq!(got, next_expected);
            next_expected += 1;
        }
    }
    while let Ok(n) = queue.consume(&mut dst) {
        let got = u32::from_le_bytes(dst[..n as usize].try_into().unwrap());
        assert_eq!(got, next_expected);
        next_expected += 1;
    }
    assert_eq!(next_expected, 500);
}

#[test]
fn miri_non_first_time_attach_reads_existing_header() {
    let capacity = 4096u64;
    let total = (4096 + capacity) as usize;
    let mut region = vec![0u8; total];
    {
        let queue = unsafe { Queue::new(region.as_mut_ptr(), capacity, true, false).unwrap() };
        queue.produce(b"persisted").unwrap();
    }
    let queue2 = unsafe { Queue::new(region.as_mut_ptr(), capacity, false, false).unwrap() };
    let mut dst = [0u8; 32];
    let n = queue2.consume(&mut dst).unwrap();
    assert_eq!(&dst[..n as usize], b"persisted");
}
