//! Routing cost of the live pattern index.
//!
//! Run with: `cargo bench --bench pattern_index`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use futures::{FutureExt, StreamExt};
use quadstream_live::{LiveChannel, PatternIndex, StreamingStore};
use quadstream_types::{Quad, QuadPattern};

fn pattern_for(i: usize) -> QuadPattern {
    match i % 4 {
        0 => QuadPattern::any().with_subject(format!("s{i}")),
        1 => QuadPattern::any().with_predicate(format!("p{}", i % 16)),
        2 => QuadPattern::any().with_subject(format!("s{i}")).with_object("o"),
        _ => QuadPattern::any(),
    }
}

fn build_index(channels: usize) -> (PatternIndex, Vec<quadstream_live::ChannelReceiver>) {
    let mut index = PatternIndex::new();
    let mut receivers = Vec::with_capacity(channels);
    for i in 0..channels {
        let (channel, receiver) = LiveChannel::new();
        index.register(channel, &pattern_for(i));
        receivers.push(receiver);
    }
    (index, receivers)
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_lookup");
    let quad = Quad::triple("s1", "p1", "o");

    for channels in [0usize, 16, 256, 4096] {
        let (index, _receivers) = build_index(channels);
        group.bench_with_input(BenchmarkId::from_parameter(channels), &quad, |b, quad| {
            b.iter(|| black_box(index.lookup(black_box(quad))));
        });
    }
    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import_with_live_reads");
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let batch: Vec<Quad> = (0..1_000)
        .map(|i| Quad::triple(format!("s{i}"), format!("p{}", i % 16), "o"))
        .collect();

    for reads in [0usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(reads), &batch, |b, batch| {
            b.iter(|| {
                rt.block_on(async {
                    let store = StreamingStore::default();
                    let mut live: Vec<_> = (0..reads).map(|i| store.read(pattern_for(i))).collect();
                    // First pull initializes each read so imports route to it.
                    for read in &mut live {
                        let _ = read.next().now_or_never();
                    }
                    let summary = store.write_all(batch.clone()).await.unwrap();
                    store.finalize();
                    black_box(summary)
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lookup, bench_import);
criterion_main!(benches);
