use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use recycle_rc::{FreeList, Link, Managed, Recyclable, RefCount, UnmanageKey, recycle};
use std::hint::black_box;
use std::ptr::NonNull;
use std::sync::Arc;
use std::thread;

const BUFFER_SIZE: usize = 4096;

struct Buffer {
    rc: RefCount,
    link: Link<Buffer>,
    bytes: Vec<u8>,
}

impl Buffer {
    fn new() -> Self {
        Self {
            rc: RefCount::new(),
            link: Link::new(),
            bytes: vec![0; BUFFER_SIZE],
        }
    }
}

unsafe impl Managed for Buffer {
    fn ref_count(&self) -> &RefCount {
        &self.rc
    }

    unsafe fn unmanage(this: NonNull<Self>, key: &UnmanageKey) {
        unsafe { recycle(this, key) }
    }
}

unsafe impl Recyclable for Buffer {
    fn link(&self) -> &Link<Self> {
        &self.link
    }
}

/// Benchmark: Single-threaded get/release round trip vs a fresh allocation
fn bench_round_trip(c: &mut Criterion) {
    c.bench_function("free_list_get_release", |b| {
        let pool = FreeList::builder().prefill(1, Buffer::new).build();

        b.iter(|| {
            let buf = pool.get();
            black_box(buf.bytes.len());
        });
    });

    c.bench_function("box_alloc_free", |b| {
        b.iter(|| {
            let buf = Box::new(vec![0u8; BUFFER_SIZE]);
            black_box(buf.len());
        });
    });
}

/// Benchmark: Contended pool access
///
/// Each thread repeatedly takes a buffer, shares it with one clone and lets
/// both handles go. The pool holds one buffer per thread.
fn bench_contended_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_pool");

    for num_threads in [1, 2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("threads", num_threads),
            num_threads,
            |b, &num_threads| {
                let pool = Arc::new(
                    FreeList::builder()
                        .label("bench")
                        .prefill(num_threads, Buffer::new)
                        .build(),
                );

                b.iter(|| {
                    let workers: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let pool = Arc::clone(&pool);
                            thread::spawn(move || {
                                for _ in 0..1000 {
                                    let buf = pool.get();
                                    if buf.is_null() {
                                        continue;
                                    }
                                    let reader = buf.clone();
                                    black_box(reader.bytes[0]);
                                }
                            })
                        })
                        .collect();

                    for worker in workers {
                        let _ = worker.join();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_round_trip, bench_contended_pool);
criterion_main!(benches);
