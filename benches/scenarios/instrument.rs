//! Benchmarks for full instrument ticks.

use std::{collections::VecDeque, hint::black_box};

use criterion::{BenchmarkId, Criterion};
use cvgen::{
    io::panel::Knob,
    synth::{ControlMessage, Instrument, VoiceMode},
    EngineConfig,
};

use crate::TICK_BATCHES;

fn chord(mode: VoiceMode) -> Instrument<VecDeque<ControlMessage>> {
    let config = EngineConfig::default().with_voice_mode(mode);
    let mut script = VecDeque::new();
    for (knob, value) in [
        (Knob::Attack, 20),
        (Knob::Decay, 40),
        (Knob::Sustain, 700),
        (Knob::Release, 300),
        (Knob::Glide, 200),
        (Knob::LfoRate, 800),
        (Knob::LfoVcoAmount, 300),
        (Knob::LfoVcfAmount, 600),
    ] {
        script.push_back(knob.message(value));
    }
    for note in [48, 52, 55, 59, 62, 65] {
        script.push_back(ControlMessage::NoteOn { note, velocity: 110 });
    }
    match Instrument::new(&config, script) {
        Ok(instrument) => instrument,
        Err(err) => panic!("default config rejected: {err}"),
    }
}

pub fn bench_instrument(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/instrument");

    for &ticks in TICK_BATCHES {
        // === SIX HELD VOICES ===
        // Worst case for the tick: every slot ramping with vibrato
        let mut poly = chord(VoiceMode::Poly1);
        group.bench_with_input(BenchmarkId::new("poly1_chord", ticks), &ticks, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    black_box(poly.tick());
                }
            })
        });

        // === MONO STACK ===
        // One voice on six oscillators, the cheapest busy case
        let mut mono = chord(VoiceMode::Mono6);
        group.bench_with_input(BenchmarkId::new("mono6", ticks), &ticks, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    black_box(mono.tick());
                }
            })
        });

        // === MESSAGE TRAFFIC ===
        // Bend and wheel updates arriving every tick
        let mut busy = chord(VoiceMode::Poly2);
        let mut bend: i32 = 0;
        group.bench_with_input(BenchmarkId::new("bend_traffic", ticks), &ticks, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    bend = if bend >= 100 { -100 } else { bend + 1 };
                    busy.apply(ControlMessage::PitchBend { increments: bend });
                    black_box(busy.tick());
                }
            })
        });
    }

    group.finish();
}
