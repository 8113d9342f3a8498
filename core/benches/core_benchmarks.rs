use criterion::{Criterion, black_box, criterion_group, criterion_main};

use marigold_core::pool::{ObjectPool, Poolable, Pooled};

#[derive(Default)]
struct Scratch {
    values: Vec<u64>,
}

impl Poolable for Scratch {
    fn new_empty() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.values.clear();
    }
}

// ---------------------------------------------------------------------------
// Object pool churn
// ---------------------------------------------------------------------------

fn bench_object_pool_insert_remove(c: &mut Criterion) {
    c.bench_function("object_pool_insert_remove_256", |b| {
        let mut pool: ObjectPool<u64> = ObjectPool::new();
        b.iter(|| {
            let handles: Vec<_> = (0..256).map(|i| pool.insert(black_box(i))).collect();
            for handle in handles {
                pool.remove(handle);
            }
        });
    });
}

fn bench_object_pool_lookup(c: &mut Criterion) {
    let mut pool: ObjectPool<u64> = ObjectPool::new();
    let handles: Vec<_> = (0..256).map(|i| pool.insert(i)).collect();
    c.bench_function("object_pool_lookup_256", |b| {
        b.iter(|| {
            for &handle in &handles {
                black_box(pool.get(black_box(handle)));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Pooled recycling
// ---------------------------------------------------------------------------

fn bench_pooled_recycle(c: &mut Criterion) {
    c.bench_function("pooled_recycle", |b| {
        let mut slot: Pooled<Scratch> = Pooled::default();
        b.iter(|| {
            let scratch = slot.activate();
            scratch.values.extend(0..black_box(128u64));
            slot.release();
        });
    });
}

criterion_group!(
    benches,
    bench_object_pool_insert_remove,
    bench_object_pool_lookup,
    bench_pooled_recycle,
);
criterion_main!(benches);
