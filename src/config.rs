//! Engine-wide constants that shape the generators.
//!
//! The defaults reproduce the hardware calibration of the reference voice
//! board. Everything here is read once at construction; nothing in the tick
//! path consults the config again.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{synth::instrument::VoiceMode, VELOCITY_MAX};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Ticks per knob step for attack/decay/release lengths.
    pub time_scalar: u32,
    /// Amplitude units per velocity step.
    pub amplitude_scalar: u16,
    /// Level an attack starts from instead of true zero.
    pub attack_floor: u16,
    /// Attack/decay stop once they are this close to their target.
    pub ramp_dead_zone: u16,
    /// Release stops once the level falls to this value.
    pub release_dead_zone: u16,
    /// Shortest LFO period in ticks, reached with the rate knob at maximum.
    pub lfo_min_period: u16,
    /// Bend offset that reaches a full whole step.
    pub bend_increments: u16,
    /// MIDI channel (0-15) the decoder listens on.
    pub midi_channel: u8,
    pub voice_mode: VoiceMode,
    /// Slots in the control ring buffer between polling and tick contexts.
    pub control_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_scalar: 100,
            amplitude_scalar: 32,
            attack_floor: 300,
            ramp_dead_zone: 1,
            release_dead_zone: 200,
            lfo_min_period: 8,
            bend_increments: 100,
            midi_channel: 0,
            voice_mode: VoiceMode::Poly1,
            control_queue_capacity: 64,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_scalar(mut self, time_scalar: u32) -> Self {
        self.time_scalar = time_scalar;
        self
    }

    pub fn with_amplitude_scalar(mut self, amplitude_scalar: u16) -> Self {
        self.amplitude_scalar = amplitude_scalar;
        self
    }

    pub fn with_midi_channel(mut self, channel: u8) -> Self {
        self.midi_channel = channel;
        self
    }

    pub fn with_voice_mode(mut self, mode: VoiceMode) -> Self {
        self.voice_mode = mode;
        self
    }

    pub fn with_control_queue_capacity(mut self, capacity: usize) -> Self {
        self.control_queue_capacity = capacity;
        self
    }

    /// Largest amplitude an envelope can reach (full velocity).
    pub fn max_amplitude(&self) -> u32 {
        u32::from(VELOCITY_MAX) * u32::from(self.amplitude_scalar)
    }

    /// Check the invariants the generators rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_amplitude = self.max_amplitude();
        let result = if max_amplitude > u32::from(u16::MAX) {
            Err(ConfigError::AmplitudeOverflow {
                scalar: self.amplitude_scalar,
            })
        } else if u32::from(self.attack_floor) > max_amplitude {
            Err(ConfigError::FloorAboveMax {
                floor: self.attack_floor,
                max: max_amplitude,
            })
        } else if self.lfo_min_period == 0 {
            Err(ConfigError::ZeroLfoPeriod)
        } else if self.bend_increments == 0 {
            Err(ConfigError::ZeroBendIncrements)
        } else if self.midi_channel > 15 {
            Err(ConfigError::MidiChannel(self.midi_channel))
        } else if self.control_queue_capacity == 0 {
            Err(ConfigError::ZeroQueueCapacity)
        } else {
            Ok(())
        };

        if let Err(err) = &result {
            log::debug!("rejected engine config: {err}");
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    AmplitudeOverflow { scalar: u16 },
    FloorAboveMax { floor: u16, max: u32 },
    ZeroLfoPeriod,
    ZeroBendIncrements,
    MidiChannel(u8),
    ZeroQueueCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::AmplitudeOverflow { scalar } => {
                write!(f, "amplitude scalar {scalar} overflows a 16-bit level at full velocity")
            }
            ConfigError::FloorAboveMax { floor, max } => {
                write!(f, "attack floor {floor} exceeds maximum amplitude {max}")
            }
            ConfigError::ZeroLfoPeriod => write!(f, "LFO minimum period must be at least one tick"),
            ConfigError::ZeroBendIncrements => write!(f, "bend increments must be non-zero"),
            ConfigError::MidiChannel(channel) => {
                write!(f, "MIDI channel {channel} is outside 0-15")
            }
            ConfigError::ZeroQueueCapacity => write!(f, "control queue needs at least one slot"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.max_amplitude(), 4064);
    }

    #[test]
    fn rejects_zero_lfo_period() {
        let mut config = EngineConfig::default();
        config.lfo_min_period = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroLfoPeriod));
    }

    #[test]
    fn rejects_overflowing_amplitude_scalar() {
        let config = EngineConfig::default().with_amplitude_scalar(1000);
        assert_eq!(
            config.validate(),
            Err(ConfigError::AmplitudeOverflow { scalar: 1000 })
        );
    }

    #[test]
    fn rejects_floor_above_reachable_level() {
        let config = EngineConfig::default().with_amplitude_scalar(2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FloorAboveMax { floor: 300, max: 254 })
        ));
    }

    #[test]
    fn rejects_out_of_range_channel() {
        let config = EngineConfig::default().with_midi_channel(16);
        assert_eq!(config.validate(), Err(ConfigError::MidiChannel(16)));
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("outside 0-15"));
    }
}
