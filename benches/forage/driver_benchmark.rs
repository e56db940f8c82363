use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kvforage::{ForageOptions, LocalForage};
use serde_json::json;
use tokio::runtime::Runtime;

const NUM_ITEMS: usize = 10_000;

// ========== 辅助函数 ==========

fn generate_key(i: usize) -> String {
    format!("key_{:010}", i)
}

fn new_store(name: &str) -> LocalForage {
    LocalForage::new(ForageOptions::new().with_name(name)).unwrap()
}

// ========== 1. 顺序写入 ==========

fn benchmark_sequential_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("sequential_set");

    group.bench_function(BenchmarkId::from_parameter("MemoryDriver"), |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = new_store("bench_set");
                for i in 0..NUM_ITEMS {
                    black_box(store.set_item(generate_key(i), json!(i)).await.unwrap());
                }
            })
        })
    });

    group.finish();
}

// ========== 2. 顺序读取 ==========

fn benchmark_sequential_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = new_store("bench_get");
    rt.block_on(async {
        for i in 0..NUM_ITEMS {
            store.set_item(generate_key(i), json!(i)).await.unwrap();
        }
    });

    let mut group = c.benchmark_group("sequential_get");
    group.bench_function(BenchmarkId::from_parameter("MemoryDriver"), |b| {
        b.iter(|| {
            rt.block_on(async {
                for i in 0..NUM_ITEMS {
                    black_box(store.get_item(generate_key(i)).await.unwrap());
                }
            })
        })
    });

    group.finish();
}

// ========== 3. 初始化前并发写入 ==========

fn benchmark_queued_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("queued_set");

    for count in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                rt.block_on(async {
                    let store = new_store("bench_queued");
                    let writes: Vec<_> = (0..count)
                        .map(|i| store.set_item(generate_key(i), json!(i)))
                        .collect();
                    black_box(futures::future::try_join_all(writes).await.unwrap());
                })
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sequential_set,
    benchmark_sequential_get,
    benchmark_queued_set
);
criterion_main!(benches);
