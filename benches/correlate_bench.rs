//! Benchmarks for cross-stream correlation at varying event volumes.
//!
//! Run with: `cargo bench --bench correlate_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vscompare::compare::{CorrelationStrategy, Correlator, EventStore};
use vscompare::{ComparisonSession, Event, SessionOptions, StreamId, StreamInput};

const TYPES: [&str; 4] = ["motion", "person", "vehicle", "alert"];

/// Deterministic per-stream events spread over `span` seconds.
///
/// Timestamps drift per stream so that some, not all, same-typed events fall
/// inside the correlation window.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn generate_events(stream: u32, count: usize, span: f64) -> Vec<Event> {
    let step = span / count as f64;
    (0..count)
        .map(|i| {
            let jitter = f64::from((stream * 7 + i as u32 * 13) % 50) / 10.0;
            Event::new(
                format!("s{stream}-e{i}"),
                i as f64 * step + jitter,
                TYPES[(i + stream as usize) % TYPES.len()],
                "generated",
                0.8,
            )
        })
        .collect()
}

fn store_with(streams: u32, per_stream: usize) -> EventStore {
    let mut store = EventStore::new();
    for s in 1..=streams {
        store
            .set_events(StreamId(s), generate_events(s, per_stream, 600.0))
            .unwrap();
    }
    store
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlate");

    let sizes: &[(u32, usize, &str)] = &[
        (2, 50, "2x50"),
        (4, 100, "4x100"),
        (8, 200, "8x200"),
        (8, 1_000, "8x1000"),
    ];

    for &(streams, per_stream, label) in sizes {
        let store = store_with(streams, per_stream);
        group.throughput(Throughput::Elements(store.event_count() as u64));

        let cross = Correlator::new().strategy(CorrelationStrategy::CrossProduct);
        group.bench_with_input(BenchmarkId::new("cross_product", label), &store, |b, store| {
            b.iter(|| black_box(cross.correlate_store(black_box(store))));
        });

        let sweep = Correlator::new().strategy(CorrelationStrategy::SortedSweep);
        group.bench_with_input(BenchmarkId::new("sorted_sweep", label), &store, |b, store| {
            b.iter(|| black_box(sweep.correlate_store(black_box(store))));
        });
    }

    group.finish();
}

fn bench_playback_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("playback_tick");

    // Memoized correlation: a tick only filters active events
    let inputs = (1..=4)
        .map(|s| {
            StreamInput::new(s, format!("{s}.mp4")).with_events(generate_events(s, 200, 600.0))
        })
        .collect();
    let mut session = ComparisonSession::load(inputs, SessionOptions::default()).unwrap();
    session.on_player_duration(0, 600.0);

    let mut t = 0.0;
    group.bench_function("timeline_4x200", |b| {
        b.iter(|| {
            t = (t + 0.25) % 600.0;
            session.on_player_time(0, t);
            black_box(session.timeline().active_correlated().len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_playback_tick);
criterion_main!(benches);
