//! Output engine benchmark suite.
//!
//! Benchmarks the costs that dominate real programs:
//! - Apply chains of increasing depth, settled after construction
//! - Joins of increasing width
//! - Result-type lookup in the registry
//!
//! Run:
//!   cargo bench --bench output_chain

#![allow(missing_docs)]
#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use eventual::registry::output_type_of;
use eventual::test_utils::block_on;
use eventual::{Output, Value, all};
use std::collections::HashMap;

// =============================================================================
// APPLY CHAIN BENCHMARKS
// =============================================================================

/// Builds a chain of `depth` continuations on a pending root, settles the
/// root, and waits for the tail.
fn bench_apply_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("output/apply_chain");

    for &depth in &[1usize, 8, 32] {
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("map_depth", depth), &depth, |b, &depth| {
            b.iter(|| {
                let (root, resolver) = Output::<u64>::new();
                let mut tail = root;
                for _ in 0..depth {
                    tail = tail.map(|v| v + 1);
                }
                resolver.resolve(0);
                black_box(block_on(tail.value()))
            })
        });
    }

    group.bench_function("and_then_nested_2", |b| {
        b.iter(|| {
            let out = Output::known(1_u64)
                .and_then(|v| Ok(Output::known(v).and_then(|v| Ok(Output::known(v + 1)))));
            black_box(block_on(out.value()))
        })
    });

    group.finish();
}

// =============================================================================
// JOIN BENCHMARKS
// =============================================================================

fn bench_all_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("output/all");

    for &width in &[0usize, 4, 64] {
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("known_inputs", width), &width, |b, &width| {
            b.iter(|| {
                let joined = all((0..width).map(Output::known));
                black_box(block_on(joined.value()))
            })
        });
    }

    group.finish();
}

// =============================================================================
// REGISTRY BENCHMARKS
// =============================================================================

fn bench_registry_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("output/registry");

    group.bench_function("registered_scalar", |b| {
        b.iter(|| black_box(output_type_of::<i64>()))
    });
    group.bench_function("registered_map", |b| {
        b.iter(|| black_box(output_type_of::<HashMap<String, Value>>()))
    });
    group.bench_function("fallback", |b| {
        b.iter(|| black_box(output_type_of::<Vec<Vec<u8>>>()))
    });

    group.finish();
}

// =============================================================================
// MAIN
// =============================================================================

criterion_group!(
    benches,
    bench_apply_chain,
    bench_all_width,
    bench_registry_lookup,
);

criterion_main!(benches);
