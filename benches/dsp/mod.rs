//! Benchmarks for the individual control-signal generators.

mod envelope;
mod lfo;
mod pitch;

pub use envelope::bench_envelope;
pub use lfo::bench_lfo;
pub use pitch::bench_pitch;
