//! Benchmarks for overlay synchronization and reference parsing.
//!
//! Measures the cost of one sampling tick over claim sets of realistic and
//! pathological size, and of extracting video ids from user input.
//!
//! Run with: `cargo bench --bench overlay_bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use factcue::{Claim, ClaimSet, OverlaySynchronizer, Verdict, VideoId};

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// One claim every `spacing` seconds.
fn claim_set(count: usize, spacing: f64) -> Arc<ClaimSet> {
    #[allow(clippy::cast_precision_loss)]
    let claims = (0..count)
        .map(|i| {
            Claim::new(
                i as f64 * spacing,
                Verdict::Misleading,
                "claim text",
                "explanation text",
            )
        })
        .collect();
    Arc::new(ClaimSet::new(claims))
}

const REFERENCES: &[&str] = &[
    "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    "https://youtu.be/dQw4w9WgXcQ?t=42",
    "https://youtube.com/embed/dQw4w9WgXcQ",
    "https://vimeo.com/12345",
];

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

fn bench_steady_playback(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_tick_playback");

    for count in [20_usize, 200, 2000] {
        let claims = claim_set(count, 7.5);
        group.bench_with_input(BenchmarkId::from_parameter(count), &claims, |b, claims| {
            let mut sync = OverlaySynchronizer::new(Arc::clone(claims), 3.0);
            let mut t = 0.0;
            b.iter(|| {
                t += 0.5;
                if t > 15_000.0 {
                    t = 0.0;
                }
                black_box(sync.tick(black_box(t)))
            });
        });
    }

    group.finish();
}

fn bench_dense_seek(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_tick_seek");

    // Every claim overlaps every other; each seek empties and refills all slots.
    let claims = claim_set(500, 0.001);
    group.bench_function("all_windows_overlap", |b| {
        let mut sync = OverlaySynchronizer::new(Arc::clone(&claims), 3.0);
        let mut inside = false;
        b.iter(|| {
            inside = !inside;
            let t = if inside { 0.2 } else { 100.0 };
            black_box(sync.tick(black_box(t)))
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Reference parsing
// ---------------------------------------------------------------------------

fn bench_extract(c: &mut Criterion) {
    c.bench_function("video_id_extract", |b| {
        b.iter(|| {
            for reference in REFERENCES {
                let _ = black_box(VideoId::extract(black_box(reference)));
            }
        });
    });
}

criterion_group!(benches, bench_steady_playback, bench_dense_seek, bench_extract);
criterion_main!(benches);
