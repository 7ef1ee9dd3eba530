use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spscshm_rs::Queue;
use std::sync::Arc;
use std::thread;

const RECORDS: u64 = 1_000_000;

/// Builds a `Queue` over a heap-allocated region, for benchmarking the core
/// protocol without touching real shared memory.
fn fake_queue(capacity: u64) -> (Vec<u8>, Queue) {
    let total = (4096 + capacity) as usize;
    let mut region = vec![0u8; total];
    let queue = unsafe { Queue::new(region.as_mut_ptr(), capacity, true, false).unwrap() };
    (region, queue)
}

fn bench_single_threaded_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_threaded");
    group.throughput(Throughput::Elements(RECORDS));

    group.bench_function("produce_consume_64b", |b| {
        let (_region, queue) = fake_queue(1 << 16);
        let payload = [0u8; 64];
        let mut dst = [0u8; 64];
        b.iter(|| {
            queue.produce(&payload).unwrap();
            let n = queue.consume(&mut dst).unwrap();
            black_box(n);
        });
    });

    group.finish();
}

fn bench_record_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_sizes");

    for &size in &[16usize, 64, 256, 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let (_region, queue) = fake_queue(1 << 16);
            let payload = vec![0u8; size];
            let mut dst = vec![0u8; size];
            b.iter(|| {
                queue.produce(&payload).unwrap();
                let n = queue.consume(&mut dst).unwrap();
                black_box(n);
            });
        });
    }

    group.finish();
}

fn bench_spsc_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_threaded");
    group.throughput(Throughput::Elements(RECORDS));

    group.bench_function("producer_consumer_threads", |b| {
        b.iter(|| {
            let (region, queue) = fake_queue(1 << 20);
            let queue = Arc::new(queue);

            let producer_queue = Arc::clone(&queue);
            let producer = thread::spawn(move || {
                let payload = [0u8; 32];
                let mut sent = 0u64;
                while sent < RECORDS {
                    if producer_queue.produce(&payload).is_ok() {
                        sent += 1;
                    } else {
                        std::hint::spin_loop();
                    }
                }
            });

            let mut dst = [0u8; 32];
            let mut received = 0u64;
            while received < RECORDS {
                match queue.consume(&mut dst) {
                    Ok(n) => {
                        black_box(n);
                        received += 1;
                    }
                    Err(_) => std::hint::spin_loop(),
                }
            }

            producer.join().unwrap();
            drop(region);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_threaded_round_trip,
    bench_record_sizes,
    bench_spsc_threaded
);
criterion_main!(benches);
