//! Low Frequency Oscillator shared by every voice.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f64::consts::TAU;

use crate::{config::EngineConfig, KNOB_MAX};

/*
Low Frequency Oscillator
========================

One LFO per instrument. It has a single phase counter and two outputs: one
routed to oscillator pitch (vibrato), one to filter cutoff (wah). Each output
has its own depth knob; both follow the same waveform and phase.

Vocabulary
----------

  record length   Ticks in one LFO period. Derived from the rate knob so
                  that turning the knob up shortens the period:

                      record_length = (1023 - knob) + min_period

                  With the default minimum of 8 ticks the period runs from
                  8 ticks (knob fully up) to 1031 ticks (knob fully down).

  t               Normalized phase, phase / record_length, in [0, 1).

  depth           knob / 1023, in [0, 1]. Scales one output.


Shapes
------

  Sine     sin(2 * pi * t)
  Square   +1 for t <= 0.5, -1 after

Outputs are bipolar: depth * shape(t) lies in [-depth, depth].


Timing
------

The counter advances before the waveform is evaluated, wrapping to zero when
it reaches the record length. After `record_length` ticks the counter is back
where it started and the outputs repeat. Shortening the period below the
current phase wraps on the next tick.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoShape {
    #[default]
    Sine,
    Square,
}

impl LfoShape {
    /// Map the panel's sine/square switch.
    pub fn from_switch(sine: bool) -> Self {
        if sine {
            LfoShape::Sine
        } else {
            LfoShape::Square
        }
    }

    /// Evaluate the waveform at normalized phase `t`.
    #[inline]
    pub fn evaluate(self, t: f64) -> f64 {
        match self {
            LfoShape::Sine => (TAU * t).sin(),
            LfoShape::Square => {
                if t <= 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

impl From<bool> for LfoShape {
    fn from(sine: bool) -> Self {
        LfoShape::from_switch(sine)
    }
}

pub struct ModulationEngine {
    min_period: u16,

    vco_depth: f32,
    vcf_depth: f32,
    record_length: u16,

    phase: u16,
    vco_output: f32,
    vcf_output: f32,
}

impl Default for ModulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulationEngine {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        let min_period = config.lfo_min_period.max(1);
        Self {
            min_period,
            vco_depth: 0.0,
            vcf_depth: 0.0,
            record_length: KNOB_MAX.saturating_add(min_period),
            phase: 0,
            vco_output: 0.0,
            vcf_output: 0.0,
        }
    }

    fn depth(knob: u16) -> f32 {
        f32::from(knob.min(KNOB_MAX)) / f32::from(KNOB_MAX)
    }

    /// Depth of the pitch-routed output, from a raw knob reading.
    pub fn set_vco_depth(&mut self, knob: u16) {
        self.vco_depth = Self::depth(knob);
    }

    /// Depth of the filter-routed output, from a raw knob reading.
    pub fn set_vcf_depth(&mut self, knob: u16) {
        self.vcf_depth = Self::depth(knob);
    }

    /// Period from the rate knob: higher readings give shorter periods.
    pub fn set_record_length(&mut self, knob: u16) {
        self.record_length = (KNOB_MAX - knob.min(KNOB_MAX)).saturating_add(self.min_period);
    }

    /// Advance one tick and return `(vco, vcf)` scalars.
    pub fn tick(&mut self, shape: LfoShape) -> (f32, f32) {
        self.phase += 1;
        if self.phase >= self.record_length {
            self.phase = 0;
        }

        let t = f64::from(self.phase) / f64::from(self.record_length);
        let value = shape.evaluate(t) as f32;

        self.vco_output = self.vco_depth * value;
        self.vcf_output = self.vcf_depth * value;

        debug_assert!((-1.0..=1.0).contains(&self.vco_output));
        debug_assert!((-1.0..=1.0).contains(&self.vcf_output));
        (self.vco_output, self.vcf_output)
    }

    pub fn phase(&self) -> u16 {
        self.phase
    }

    pub fn record_length(&self) -> u16 {
        self.record_length
    }

    pub fn vco_depth(&self) -> f32 {
        self.vco_depth
    }

    pub fn vcf_depth(&self) -> f32 {
        self.vcf_depth
    }

    /// Most recent `(vco, vcf)` outputs.
    pub fn outputs(&self) -> (f32, f32) {
        (self.vco_output, self.vcf_output)
    }

    /// Restart the period from phase zero.
    pub fn reset_phase(&mut self) {
        self.phase = 0;
    }
}
