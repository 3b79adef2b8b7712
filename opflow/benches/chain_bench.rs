//! Benchmarks for chain construction and execution.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use opflow::prelude::*;
use opflow::testing::RecordingTransport;
use serde_json::json;

fn chain_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let service = OperatorService::builtin().unwrap();
    let transport: Arc<dyn Transport> =
        Arc::new(RecordingTransport::new().respond("/items", json!({"items": [1, 2, 3]})));
    let processor: Arc<dyn ResultProcessor> = Arc::new(NoOpProcessor);

    let mut group = c.benchmark_group("chain");
    for pipes in [0usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("get_pipe_unwrap", pipes), &pipes, |b, &pipes| {
            b.iter(|| {
                runtime.block_on(async {
                    let mut chain = service.operator_set(transport.clone(), processor.clone());
                    chain.get("/items").unwrap();
                    for _ in 0..pipes {
                        chain.pipe(|v| Ok(v.cloned())).unwrap();
                    }
                    black_box(chain.unwrap().await.unwrap())
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, chain_benchmark);
criterion_main!(benches);
