//! Hot-path overhead benchmarks.
//!
//! # Metrics
//! - `naming/metric_id`: id construction, named and unnamed forms
//! - `accounting/request_timer`: one full start/finish accounting cycle,
//!   which is the fixed per-request cost the instrumentation adds
//!
//! # Usage
//! ```bash
//! cargo bench --bench overhead
//! ```

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use metered_http::MeterRegistry;
use metered_http::instrument::{RequestMetrics, RequestTimer};
use metered_http::metric_id;

fn bench_metric_id(c: &mut Criterion) {
    c.bench_function("naming/metric_id_unnamed", |b| {
        b.iter(|| metric_id(None, "network_requests_submitted"))
    });

    c.bench_function("naming/metric_id_named", |b| {
        b.iter(|| metric_id(Some("api"), "network_requests_submitted"))
    });
}

fn bench_request_timer(c: &mut Criterion) {
    let mut registry = MeterRegistry::new();
    let metrics =
        Arc::new(RequestMetrics::register(&mut registry, None).expect("register metrics"));

    c.bench_function("accounting/request_timer", |b| {
        b.iter(|| RequestTimer::start(Arc::clone(&metrics)).finish())
    });
}

criterion_group!(benches, bench_metric_id, bench_request_timer);
criterion_main!(benches);
