//! Per-tick control-signal generators.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! call from a timer interrupt. Each `tick()` is O(1) and reads only the inputs
//! its setters stored since the previous tick.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Shared sine/square LFO with pitch and filter outputs.
pub mod lfo;
/// Glide and pitch-bend engine.
pub mod pitch;
/// Calibrated note to DAC code lookup.
pub mod pitch_table;

pub use envelope::{EnvelopeEngine, EnvelopePhase};
pub use lfo::{LfoShape, ModulationEngine};
pub use pitch::PitchEngine;
pub use pitch_table::PitchTable;
