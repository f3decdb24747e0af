// Criterion benchmarks for ytrpc-metrics
//
// Run benchmarks with:
//   cargo bench -p ytrpc-metrics

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use ytrpc_metrics::{BalancingMetrics, BalancingMetricsRegistry};

fn bench_counters(c: &mut Criterion) {
    let mut group = c.benchmark_group("counters");

    let registry = BalancingMetricsRegistry::new();

    group.bench_function("dispatch_lifecycle", |b| {
        b.iter(|| {
            registry.total_inc();
            registry.inflight_inc();
            registry.inflight_dec();
        });
    });

    let sink: Arc<dyn BalancingMetrics> = Arc::new(BalancingMetricsRegistry::new());
    group.bench_function("dispatch_lifecycle_dyn", |b| {
        b.iter(|| {
            sink.total_inc();
            sink.inflight_inc();
            sink.inflight_dec();
        });
    });

    group.finish();
}

fn bench_endpoint_requests(c: &mut Criterion) {
    let mut group = c.benchmark_group("endpoint_requests");

    for endpoint_count in [1, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(endpoint_count),
            endpoint_count,
            |b, &count| {
                let registry = BalancingMetricsRegistry::new();
                let addrs: Vec<String> = (0..count).map(|i| format!("proxy-{}:9013", i)).collect();
                let mut i = 0;
                b.iter(|| {
                    registry.record_endpoint_request(black_box(&addrs[i % addrs.len()]));
                    i += 1;
                });
            },
        );
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let registry = BalancingMetricsRegistry::new();
    for i in 0..50 {
        registry.record_endpoint_request(&format!("proxy-{}:9013", i));
    }

    c.bench_function("snapshot_50_endpoints", |b| {
        b.iter(|| registry.snapshot());
    });
}

criterion_group!(benches, bench_counters, bench_endpoint_requests, bench_snapshot);
criterion_main!(benches);
