pub mod config; // Engine constants and validation
pub mod dsp;
pub mod io;
pub mod synth; // Voice management and the per-tick driver

pub use config::{ConfigError, EngineConfig};

/// Highest raw reading delivered by the 10-bit front-panel ADC.
pub const KNOB_MAX: u16 = 1023;
/// Highest MIDI velocity.
pub const VELOCITY_MAX: u8 = 127;
/// Highest code accepted by the 12-bit pitch DAC.
pub const MAX_PITCH_CODE: u16 = 4095;
