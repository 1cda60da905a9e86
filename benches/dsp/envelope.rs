//! Benchmarks for the ADSR envelope engine.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use cvgen::dsp::{EnvelopeEngine, EnvelopePhase};

use crate::TICK_BATCHES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &ticks in TICK_BATCHES {
        // Attack phase (long ramp, never completes inside the bench)
        let mut env = EnvelopeEngine::new();
        env.set_attack(1023);
        env.set_velocity(127);
        env.set_phase(EnvelopePhase::Attack);
        group.bench_with_input(BenchmarkId::new("attack", ticks), &ticks, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    black_box(env.tick());
                }
            })
        });

        // Sustain phase (holding steady)
        let mut env = EnvelopeEngine::new();
        env.set_sustain(700);
        env.set_velocity(100);
        env.set_phase(EnvelopePhase::Attack);
        for _ in 0..4 {
            env.tick();
        }
        group.bench_with_input(BenchmarkId::new("sustain", ticks), &ticks, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    black_box(env.tick());
                }
            })
        });

        // Release phase (ramping down)
        let mut env = EnvelopeEngine::new();
        env.set_sustain(1023);
        env.set_release(1023);
        env.set_velocity(127);
        env.set_phase(EnvelopePhase::Attack);
        for _ in 0..4 {
            env.tick();
        }
        env.set_phase(EnvelopePhase::Release);
        group.bench_with_input(BenchmarkId::new("release", ticks), &ticks, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    black_box(env.tick());
                }
            })
        });
    }

    group.finish();
}
