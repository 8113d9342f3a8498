use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use marigold_graphics::{
    ComputePass, GraphicsPass, PipelineStages, QueueSet, RenderGraph, TextureDescriptor,
    TextureFormat, TransientMemoryPool,
};

/// Build a frame with `depth` chained passes, each reading the previous
/// pass's output and writing its own.
fn build_chain(depth: usize) -> (RenderGraph, TransientMemoryPool) {
    let pool = TransientMemoryPool::new(1 << 30);
    let mut graph = RenderGraph::new();

    let mut previous = None;
    for i in 0..depth {
        let target = graph.create_texture(
            TextureDescriptor::new_2d(256, 256, TextureFormat::Rgba8Unorm)
                .with_label(format!("target_{i}")),
        );
        let mut pass =
            GraphicsPass::new(format!("pass_{i}")).write_texture(target, PipelineStages::COLOR_ATTACHMENT);
        if let Some(previous) = previous {
            pass = pass.read_texture(previous, PipelineStages::FRAGMENT_SHADER);
        }
        graph.add_graphics_pass(pass);
        previous = Some(target);
    }
    (graph, pool)
}

/// Build a frame of `width` independent compute passes.
fn build_wide(width: usize) -> (RenderGraph, TransientMemoryPool) {
    let pool = TransientMemoryPool::new(1 << 30);
    let mut graph = RenderGraph::new();

    for i in 0..width {
        let target = graph.create_texture(
            TextureDescriptor::new_2d(128, 128, TextureFormat::Rgba16Float)
                .with_label(format!("slice_{i}")),
        );
        graph.add_compute_pass(
            ComputePass::new(format!("compute_{i}"))
                .write_texture(target, PipelineStages::COMPUTE_SHADER),
        );
    }
    (graph, pool)
}

fn bench_compile_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_chain");
    for depth in [8usize, 32, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let queues = QueueSet::full();
            b.iter_batched(
                || build_chain(depth),
                |(mut graph, pool)| {
                    graph.compile(&queues, &pool).unwrap();
                    black_box(graph.compiled().unwrap().order.len());
                    graph.clear(&pool);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_compile_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_wide");
    for width in [8usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            let queues = QueueSet::full();
            b.iter_batched(
                || build_wide(width),
                |(mut graph, pool)| {
                    graph.compile(&queues, &pool).unwrap();
                    black_box(graph.schedule().unwrap().entries.len());
                    graph.clear(&pool);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_pool_allocate(c: &mut Criterion) {
    c.bench_function("pool_allocate_free", |b| {
        let pool = TransientMemoryPool::new(64 << 20);
        b.iter(|| {
            let range = pool.allocate(black_box(4096), 256).unwrap();
            pool.free(range);
        });
    });
}

criterion_group!(
    benches,
    bench_compile_chain,
    bench_compile_wide,
    bench_pool_allocate
);
criterion_main!(benches);
