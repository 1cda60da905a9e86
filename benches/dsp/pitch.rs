//! Benchmarks for glide and bend resolution.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use cvgen::dsp::{EnvelopePhase, PitchEngine};

use crate::TICK_BATCHES;

pub fn bench_pitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/pitch");

    for &ticks in TICK_BATCHES {
        // Settled note, table lookup only
        let mut pitch = PitchEngine::new();
        pitch.tick(60, EnvelopePhase::Attack);
        group.bench_with_input(BenchmarkId::new("steady", ticks), &ticks, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    black_box(pitch.tick(black_box(60), EnvelopePhase::Sustain));
                }
            })
        });

        // Long glide with the wheel bent, interpolating every tick
        let mut pitch = PitchEngine::new();
        pitch.set_glide_length(u16::MAX);
        pitch.set_pitch_bend(37);
        pitch.tick(40, EnvelopePhase::Attack);
        pitch.tick(80, EnvelopePhase::Attack);
        group.bench_with_input(BenchmarkId::new("glide_bent", ticks), &ticks, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    black_box(pitch.tick(black_box(80), EnvelopePhase::Decay));
                }
            })
        });
    }

    group.finish();
}
