//! Benchmarks for the modulation LFO.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use cvgen::dsp::{LfoShape, ModulationEngine};

use crate::TICK_BATCHES;

pub fn bench_lfo(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/lfo");

    for &ticks in TICK_BATCHES {
        for shape in [LfoShape::Sine, LfoShape::Square] {
            let mut lfo = ModulationEngine::new();
            lfo.set_record_length(900);
            lfo.set_vco_depth(512);
            lfo.set_vcf_depth(1023);
            let name = format!("{shape:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, ticks), &ticks, |b, &n| {
                b.iter(|| {
                    for _ in 0..n {
                        black_box(lfo.tick(black_box(shape)));
                    }
                })
            });
        }
    }

    group.finish();
}
