//! # Topology Benchmarks
//!
//! Performance benchmarks for model construction, validation and persistence.
//!
//! Run with: `cargo bench -p hydronet-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hydronet_core::{
    LinkInput, Model, NodeId, NodeInput, NodeKind, Point, model_from_bytes, model_to_bytes,
};
use std::hint::black_box;

/// Create a chain Basin -> Pump -> Basin -> ... with `size` basins.
fn create_pumped_chain(size: u32) -> Model {
    let mut model = Model::new();
    let mut prev = None;

    for i in 0..size {
        let basin = model
            .add_node(
                NodeInput::new(NodeKind::Basin, Point::new(f64::from(i), 0.0)),
                vec![],
            )
            .expect("basin");
        if let Some(prev) = prev {
            let pump = model
                .add_node(
                    NodeInput::new(NodeKind::Pump, Point::new(f64::from(i), 1.0)),
                    vec![],
                )
                .expect("pump");
            model
                .add_link(&prev, &pump, LinkInput::new())
                .expect("inflow");
            model
                .add_link(&pump, &basin, LinkInput::new())
                .expect("outflow");
        }
        prev = Some(basin);
    }

    model
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_chain_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_construction");

    for size in [100u32, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_pumped_chain(size)));
        });
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    for size in [100u32, 1000].iter() {
        let model = create_pumped_chain(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &model, |b, model| {
            b.iter(|| black_box(model.validate()));
        });
    }

    group.finish();
}

fn bench_rejected_links(c: &mut Criterion) {
    let mut model = create_pumped_chain(1000);

    c.bench_function("rejected_link_1000", |b| {
        b.iter(|| {
            // Pump #3 already has its single outflow.
            let result = model
                .connect(NodeId(3), NodeId(4), LinkInput::new())
                .map(|l| l.id);
            black_box(result)
        });
    });
}

fn bench_persistence(c: &mut Criterion) {
    let model = create_pumped_chain(1000);
    let bytes = model_to_bytes(&model).expect("serialize");

    c.bench_function("model_to_bytes_1000", |b| {
        b.iter(|| black_box(model_to_bytes(&model)));
    });

    c.bench_function("model_from_bytes_1000", |b| {
        b.iter(|| black_box(model_from_bytes(&bytes)));
    });
}

criterion_group!(
    benches,
    bench_chain_construction,
    bench_validation,
    bench_rejected_links,
    bench_persistence
);
criterion_main!(benches);
