//! Generator Benchmarks
//!
//! Performance benchmarks for signal generation and encoding.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sweepgen::engine::{encode, ChannelSet};
use sweepgen::generators::{exponential_sweep, mls, pink_noise, SweepParams};
use sweepgen::progress::NoProgress;
use sweepgen::request::{EncodingFormat, SignalRequest};

fn benchmark_ess(c: &mut Criterion) {
    let params = SweepParams::new(20.0, 20000.0, 10.0, 48000);

    c.bench_function("ess_10s_48k", |b| {
        b.iter(|| exponential_sweep(black_box(&params), &mut NoProgress))
    });
}

fn benchmark_pink_noise(c: &mut Criterion) {
    c.bench_function("pink_noise_10s_48k", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            pink_noise(black_box(480_000), &mut rng, &mut NoProgress)
        })
    });
}

fn benchmark_mls(c: &mut Criterion) {
    c.bench_function("mls_order_18", |b| {
        b.iter(|| mls(black_box(18), 1, &mut NoProgress))
    });
}

fn benchmark_encode(c: &mut Criterion) {
    let params = SweepParams::new(20.0, 20000.0, 10.0, 48000);
    let sweep = exponential_sweep(&params, &mut NoProgress);
    let set = ChannelSet::new(vec![sweep.clone(), sweep], 48000).unwrap();

    c.bench_function("encode_pcm24_stereo_10s", |b| {
        b.iter(|| encode(black_box(&set), EncodingFormat::Pcm24, None, &mut NoProgress))
    });
}

fn benchmark_pipeline(c: &mut Criterion) {
    let request = SignalRequest::default();

    c.bench_function("pipeline_default_request", |b| {
        b.iter(|| sweepgen::generate(black_box(&request), &mut NoProgress))
    });
}

criterion_group!(
    benches,
    benchmark_ess,
    benchmark_pink_noise,
    benchmark_mls,
    benchmark_encode,
    benchmark_pipeline
);
criterion_main!(benches);
