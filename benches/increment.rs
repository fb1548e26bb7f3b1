use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pagehits::{HitCounter, HitCounterConfig};

const NUM_THREADS: usize = 4;
const ITERATIONS_PER_THREAD: usize = 100_000;
const NUM_KEYS: usize = 64;

fn keys() -> Vec<String> {
    (0..NUM_KEYS).map(|i| format!("{i:016x}")).collect()
}

fn bench_increment(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let keys = keys();

    let mut group = c.benchmark_group("increment");

    group.bench_function("HitCounter (single thread)", |b| {
        let hits = runtime.block_on(HitCounter::open(
            HitCounterConfig::new().data_dir(dir.path()),
        ));
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % NUM_KEYS;
            black_box(hits.increment(&keys[i]))
        })
    });

    group.bench_function(
        BenchmarkId::new(
            "HitCounter (contended)",
            format!("{}threads x {}iter", NUM_THREADS, ITERATIONS_PER_THREAD),
        ),
        |b| {
            let hits = runtime.block_on(HitCounter::open(
                HitCounterConfig::new().data_dir(dir.path()),
            ));
            b.iter(|| {
                let mut handles = vec![];
                for t in 0..NUM_THREADS {
                    let hits = hits.clone();
                    let keys = keys.clone();
                    handles.push(thread::spawn(move || {
                        for i in 0..ITERATIONS_PER_THREAD {
                            hits.increment(&keys[(i + t) % NUM_KEYS]);
                        }
                    }));
                }
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(hits.len())
            })
        },
    );

    group.bench_function(
        BenchmarkId::new(
            "Mutex<HashMap> (baseline)",
            format!("{}threads x {}iter", NUM_THREADS, ITERATIONS_PER_THREAD),
        ),
        |b| {
            b.iter(|| {
                let map = std::sync::Arc::new(Mutex::new(HashMap::<String, u64>::new()));
                let mut handles = vec![];
                for t in 0..NUM_THREADS {
                    let map = map.clone();
                    let keys = keys.clone();
                    handles.push(thread::spawn(move || {
                        for i in 0..ITERATIONS_PER_THREAD {
                            *map.lock()
                                .unwrap()
                                .entry(keys[(i + t) % NUM_KEYS].clone())
                                .or_insert(0) += 1;
                        }
                    }));
                }
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(map.lock().unwrap().len())
            })
        },
    );

    group.finish();
}

criterion_group!(benches, bench_increment);
criterion_main!(benches);
