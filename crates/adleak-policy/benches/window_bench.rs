// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Window microbenchmarks
//!
//! Covers the per-sample collect path and the per-window encode path at the
//! device build parameters. Inputs are fixed and deterministic.

use std::time::Duration;

use adleak_fixed::FixedPoint;
use adleak_policy::{AdaptiveLeakPolicy, PolicyConfig, PolicyKind};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SEQ: usize = 23;
const FEATURES: usize = 10;

fn generate_window() -> [[FixedPoint; FEATURES]; SEQ] {
    let mut window = [[FixedPoint::ZERO; FEATURES]; SEQ];
    for (t, sample) in window.iter_mut().enumerate() {
        for (f, value) in sample.iter_mut().enumerate() {
            // Slow ramp with a burst in the middle of the window
            let burst = if (8..14).contains(&t) { 400 } else { 0 };
            *value = FixedPoint::from_raw((t * 17 + f * 31 + burst) as i16);
        }
    }
    window
}

fn bench_collect_and_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy_window");
    group.sample_size(50);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));
    group.throughput(Throughput::Elements(SEQ as u64));

    let samples = generate_window();

    for kind in [
        PolicyKind::Uniform,
        PolicyKind::AdaptiveHeuristic,
        PolicyKind::AdaptiveDeviation,
    ] {
        let config = PolicyConfig {
            policy: kind,
            ..PolicyConfig::default()
        };

        group.bench_with_input(BenchmarkId::new("collect_encode", kind.name()), &config, |b, config| {
            let mut policy: AdaptiveLeakPolicy<SEQ, FEATURES> =
                AdaptiveLeakPolicy::new(*config).expect("valid config");
            let mut message = [0u8; 178];
            b.iter(|| {
                for sample in samples.iter() {
                    let _ = policy.collect(black_box(sample));
                }
                black_box(policy.encode(&mut message).expect("encode"))
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let config = PolicyConfig::default();
    let mut policy: AdaptiveLeakPolicy<SEQ, FEATURES> =
        AdaptiveLeakPolicy::new(config).expect("valid config");
    for sample in generate_window().iter() {
        policy.collect(sample).expect("collect");
    }
    let mut message = [0u8; 178];
    let written = policy.encode(&mut message).expect("encode");

    c.bench_function("decode_default_window", |b| {
        b.iter(|| adleak_policy::decode::<SEQ, FEATURES>(&config, black_box(&message[..written])))
    });
}

criterion_group!(benches, bench_collect_and_encode, bench_decode);
criterion_main!(benches);
