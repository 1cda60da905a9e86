#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{config::EngineConfig, KNOB_MAX, VELOCITY_MAX};

/*
ADSR Envelope Generator
=======================

One envelope drives one VCA. Every timer tick it produces the next amplitude
code for the VCA's DAC.

Vocabulary
----------

  level       The envelope's current output, 0 to velocity * amplitude
              scalar (4064 at full velocity with the default scalar of 32).

  phase       Attack, Decay, Sustain, Release or Off. Note-on forces Attack,
              note-off forces Release; the rest of the walk is automatic.

  knob        A raw 10-bit panel reading, 0 to 1023. Attack, decay and
              release knobs set phase lengths, the sustain knob sets the
              sustain level as a fraction of the attack peak.

  elapsed     Ticks spent in the current phase.


Phase Lengths
-------------

    length = knob * time_scalar + 1

The +1 means a knob at zero still gives a one-tick ramp, so every slope
division has a non-zero denominator.


The Ramp
--------

    Level
    peak ┤    ╱╲
         │   ╱  ╲_________
     S   │  ╱             ╲
         │ ╱               ╲
   floor ┤╱                 ╲
       0 └──────────────────────→ ticks
          A    D     S     R

Each tick of a ramping phase re-derives its slope from where the level is
now:

    slope = (target - level) / ticks_left

where `ticks_left` counts the current tick. The last tick therefore lands on
the target exactly, and rounding error from earlier ticks never accumulates.
Targets are re-read every tick too, so turning a knob mid-ramp bends the
ramp toward the new target instead of waiting for the next note.

A ramp also ends early once it is inside its dead zone: one unit for attack
and decay, 200 for release. Release snaps to zero from there.

Attack never starts from true silence. When a new attack begins, the level
is set to the attack floor (300 by default) first, whatever it was before.


Release Bookkeeping
-------------------

Entering attack arms a "first release tick" flag. The first release tick
that sees the flag clears it and restarts the elapsed counter. Releasing an
already-releasing envelope therefore continues the ramp instead of
restarting it.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopePhase {
    Attack,  // Ramping from the floor to velocity * amplitude scalar
    Decay,   // Ramping from the peak to the sustain level
    Sustain, // Holding until note-off
    Release, // Ramping to zero
    #[default]
    Off, // Silent, waiting for note-on
}

impl EnvelopePhase {
    /// The phase a completed ramp hands over to.
    pub fn next(self) -> Self {
        match self {
            EnvelopePhase::Attack => EnvelopePhase::Decay,
            EnvelopePhase::Decay => EnvelopePhase::Sustain,
            EnvelopePhase::Release => EnvelopePhase::Off,
            EnvelopePhase::Sustain => EnvelopePhase::Sustain,
            EnvelopePhase::Off => EnvelopePhase::Off,
        }
    }

    /// Position along the fixed walk Attack -> Decay -> Sustain -> Release -> Off.
    pub fn ordinal(self) -> u8 {
        match self {
            EnvelopePhase::Attack => 0,
            EnvelopePhase::Decay => 1,
            EnvelopePhase::Sustain => 2,
            EnvelopePhase::Release => 3,
            EnvelopePhase::Off => 4,
        }
    }
}

/// Per-phase ramp parameters, recomputed on every tick of their phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RampParams {
    pub slope: f64,
    pub final_amplitude: u16,
    pub time_length: u32,
}

impl RampParams {
    /// One tick of a linear ramp toward `final_amplitude`.
    ///
    /// Returns true when the ramp is finished, in which case the level has
    /// been snapped to the target and the elapsed counter reset.
    fn step(&mut self, level: &mut f64, elapsed: &mut u32, outside_dead_zone: bool) -> bool {
        let target = f64::from(self.final_amplitude);

        if *elapsed < self.time_length && outside_dead_zone {
            *elapsed += 1;
            let ticks_left = self.time_length - *elapsed + 1;
            self.slope = (target - *level) / f64::from(ticks_left);
            *level += self.slope;

            if *elapsed < self.time_length {
                return false;
            }
        }

        *level = target;
        *elapsed = 0;
        true
    }
}

fn ramp_length(knob: u16, time_scalar: u32) -> u32 {
    u32::from(knob) * time_scalar + 1
}

pub struct EnvelopeEngine {
    // Calibration (fixed at construction)
    time_scalar: u32,
    amplitude_scalar: u16,
    attack_floor: u16,
    ramp_dead_zone: u16,
    release_dead_zone: u16,

    // Inputs (last writer wins, read on the next tick)
    attack_knob: u16,
    decay_knob: u16,
    sustain_knob: u16,
    release_knob: u16,
    velocity: u8,

    attack: RampParams,
    decay: RampParams,
    release: RampParams,

    // Runtime state
    phase: EnvelopePhase,
    elapsed: u32,
    level: f64,
    first_release_tick: bool,
}

impl Default for EnvelopeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeEngine {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            time_scalar: config.time_scalar,
            amplitude_scalar: config.amplitude_scalar,
            attack_floor: config.attack_floor,
            ramp_dead_zone: config.ramp_dead_zone,
            release_dead_zone: config.release_dead_zone,

            attack_knob: 0,
            decay_knob: 0,
            sustain_knob: 0,
            release_knob: 0,
            velocity: 0,

            attack: RampParams::default(),
            decay: RampParams::default(),
            release: RampParams::default(),

            phase: EnvelopePhase::Off,
            elapsed: 0,
            level: 0.0,
            first_release_tick: false,
        }
    }

    pub fn set_attack(&mut self, knob: u16) {
        debug_assert!(knob <= KNOB_MAX);
        self.attack_knob = knob;
    }

    pub fn set_decay(&mut self, knob: u16) {
        debug_assert!(knob <= KNOB_MAX);
        self.decay_knob = knob;
    }

    pub fn set_sustain(&mut self, knob: u16) {
        debug_assert!(knob <= KNOB_MAX);
        self.sustain_knob = knob;
    }

    pub fn set_release(&mut self, knob: u16) {
        debug_assert!(knob <= KNOB_MAX);
        self.release_knob = knob;
    }

    /// Record the latest note-on velocity. Scales the attack peak.
    pub fn set_velocity(&mut self, velocity: u8) {
        debug_assert!(velocity <= VELOCITY_MAX);
        self.velocity = velocity;
    }

    /// Force a phase change from outside (note-on, note-off, voice steal).
    ///
    /// Forcing `Off` also drops the level to zero so a stolen voice goes
    /// quiet immediately.
    pub fn set_phase(&mut self, phase: EnvelopePhase) {
        match phase {
            EnvelopePhase::Attack => {
                self.first_release_tick = true;
                self.elapsed = 0;
            }
            // Release restarts its counter on its own first tick
            EnvelopePhase::Release => {}
            EnvelopePhase::Off => {
                self.elapsed = 0;
                self.level = 0.0;
            }
            EnvelopePhase::Decay | EnvelopePhase::Sustain => self.elapsed = 0,
        }
        self.phase = phase;
    }

    /// Advance the envelope by one tick and return the new amplitude.
    pub fn tick(&mut self) -> u16 {
        let finished = match self.phase {
            EnvelopePhase::Attack => {
                self.first_release_tick = true;
                if self.elapsed == 0 {
                    self.level = f64::from(self.attack_floor);
                }

                self.attack.time_length = ramp_length(self.attack_knob, self.time_scalar);
                self.attack.final_amplitude = u16::from(self.velocity) * self.amplitude_scalar;

                let remaining = f64::from(self.attack.final_amplitude) - self.level;
                let outside = remaining > f64::from(self.ramp_dead_zone);
                self.attack.step(&mut self.level, &mut self.elapsed, outside)
            }

            EnvelopePhase::Decay => {
                self.decay.time_length = ramp_length(self.decay_knob, self.time_scalar);
                self.decay.final_amplitude = (u32::from(self.attack.final_amplitude)
                    * u32::from(self.sustain_knob)
                    / u32::from(KNOB_MAX)) as u16;

                let remaining = self.level - f64::from(self.decay.final_amplitude);
                let outside = remaining > f64::from(self.ramp_dead_zone);
                self.decay.step(&mut self.level, &mut self.elapsed, outside)
            }

            EnvelopePhase::Release => {
                if self.first_release_tick {
                    self.first_release_tick = false;
                    self.elapsed = 0;
                }

                self.release.time_length = ramp_length(self.release_knob, self.time_scalar);
                self.release.final_amplitude = 0;

                let outside = self.level > f64::from(self.release_dead_zone);
                self.release.step(&mut self.level, &mut self.elapsed, outside)
            }

            EnvelopePhase::Sustain | EnvelopePhase::Off => false,
        };

        if finished {
            self.phase = self.phase.next();
        }

        debug_assert!(self.level >= 0.0 && self.level <= f64::from(self.max_amplitude()));
        self.amplitude()
    }

    /// Current amplitude, truncated to a DAC code.
    pub fn amplitude(&self) -> u16 {
        self.level as u16
    }

    /// Peak the envelope can reach at full velocity.
    pub fn max_amplitude(&self) -> u16 {
        u16::from(VELOCITY_MAX) * self.amplitude_scalar
    }

    pub fn phase(&self) -> EnvelopePhase {
        self.phase
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Returns true while the envelope is producing output (not Off).
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, EnvelopePhase::Off)
    }

    pub fn attack_params(&self) -> RampParams {
        self.attack
    }

    pub fn decay_params(&self) -> RampParams {
        self.decay
    }

    pub fn release_params(&self) -> RampParams {
        self.release
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(attack: u16, decay: u16, sustain: u16, release: u16) -> EnvelopeEngine {
        let mut env = EnvelopeEngine::new();
        env.set_attack(attack);
        env.set_decay(decay);
        env.set_sustain(sustain);
        env.set_release(release);
        env
    }

    fn run(env: &mut EnvelopeEngine, ticks: usize) {
        for _ in 0..ticks {
            env.tick();
        }
    }

    #[test]
    fn attack_lands_on_velocity_peak() {
        let mut env = envelope(5, 5, 512, 5);
        env.set_velocity(100);
        env.set_phase(EnvelopePhase::Attack);

        run(&mut env, 500);
        assert_eq!(env.phase(), EnvelopePhase::Attack);
        assert!(env.amplitude() < 3200);

        env.tick();
        assert_eq!(env.attack_params().time_length, 501);
        assert_eq!(env.amplitude(), 3200);
        assert_eq!(env.phase(), EnvelopePhase::Decay);
    }

    #[test]
    fn attack_starts_from_floor() {
        let mut env = envelope(10, 0, 0, 0);
        env.set_velocity(127);
        env.set_phase(EnvelopePhase::Attack);

        let first = env.tick();
        assert!(first > 300, "first tick should move past the floor");
        assert!(first < 310);
    }

    #[test]
    fn retrigger_restarts_from_floor() {
        let mut env = envelope(10, 0, 1023, 10);
        env.set_velocity(127);
        env.set_phase(EnvelopePhase::Attack);
        while env.phase() != EnvelopePhase::Sustain {
            env.tick();
        }
        env.set_phase(EnvelopePhase::Release);
        run(&mut env, 300);
        assert!(env.amplitude() > 2000);

        env.set_phase(EnvelopePhase::Attack);
        let first = env.tick();
        assert!(first > 300 && first < 310, "retrigger started at {first}");
        assert_eq!(env.phase(), EnvelopePhase::Attack);
    }

    #[test]
    fn zero_knob_attack_takes_one_tick() {
        let mut env = envelope(0, 0, 1023, 0);
        env.set_velocity(64);
        env.set_phase(EnvelopePhase::Attack);

        assert_eq!(env.tick(), 64 * 32);
        assert_eq!(env.phase(), EnvelopePhase::Decay);
    }

    #[test]
    fn decay_settles_on_sustain_fraction() {
        let mut env = envelope(0, 2, 512, 0);
        env.set_velocity(100);
        env.set_phase(EnvelopePhase::Attack);
        env.tick();

        run(&mut env, 201);
        assert_eq!(env.phase(), EnvelopePhase::Sustain);
        // 3200 * 512 / 1023, truncated
        assert_eq!(env.amplitude(), 1601);
        assert_eq!(env.decay_params().final_amplitude, 1601);
    }

    #[test]
    fn full_sustain_skips_decay_ramp() {
        let mut env = envelope(0, 50, 1023, 0);
        env.set_velocity(100);
        env.set_phase(EnvelopePhase::Attack);
        env.tick();
        env.tick();

        assert_eq!(env.phase(), EnvelopePhase::Sustain);
        assert_eq!(env.amplitude(), 3200);
    }

    #[test]
    fn sustain_and_off_are_idempotent() {
        let mut env = envelope(0, 0, 700, 0);
        env.set_velocity(90);
        env.set_phase(EnvelopePhase::Attack);
        run(&mut env, 3);
        assert_eq!(env.phase(), EnvelopePhase::Sustain);

        let held = env.amplitude();
        for _ in 0..1_000 {
            assert_eq!(env.tick(), held);
        }

        env.set_phase(EnvelopePhase::Release);
        run(&mut env, 10);
        assert_eq!(env.phase(), EnvelopePhase::Off);
        for _ in 0..1_000 {
            assert_eq!(env.tick(), 0);
            assert_eq!(env.phase(), EnvelopePhase::Off);
        }
    }

    #[test]
    fn release_stops_inside_dead_zone() {
        let mut env = envelope(0, 0, 1023, 10);
        env.set_velocity(127);
        env.set_phase(EnvelopePhase::Attack);
        run(&mut env, 2);
        env.set_phase(EnvelopePhase::Release);

        let mut ticks = 0;
        while env.phase() == EnvelopePhase::Release {
            env.tick();
            ticks += 1;
        }

        // 1001-tick ramp from 4064 crosses 200 before its last tick
        assert!(ticks < 1001, "release took {ticks} ticks");
        assert_eq!(env.amplitude(), 0);
    }

    #[test]
    fn release_counter_restarts_once_per_note() {
        let mut env = envelope(0, 0, 1023, 10);
        env.set_velocity(127);
        env.set_phase(EnvelopePhase::Attack);
        run(&mut env, 2);

        env.set_phase(EnvelopePhase::Release);
        run(&mut env, 100);
        assert_eq!(env.elapsed(), 100);

        // A second note-off continues the ramp
        env.set_phase(EnvelopePhase::Release);
        env.tick();
        assert_eq!(env.elapsed(), 101);
    }

    #[test]
    fn release_from_low_level_finishes_immediately() {
        let mut env = envelope(0, 0, 0, 500);
        env.set_velocity(5);
        env.set_phase(EnvelopePhase::Attack);
        run(&mut env, 3);

        env.set_phase(EnvelopePhase::Release);
        env.tick();
        assert_eq!(env.phase(), EnvelopePhase::Off);
    }

    #[test]
    fn forced_off_silences() {
        let mut env = envelope(3, 0, 1023, 0);
        env.set_velocity(127);
        env.set_phase(EnvelopePhase::Attack);
        run(&mut env, 100);
        assert!(env.amplitude() > 0);

        env.set_phase(EnvelopePhase::Off);
        assert_eq!(env.tick(), 0);
        assert!(!env.is_active());
    }
}
