use crate::{
    config::EngineConfig,
    dsp::{
        envelope::EnvelopePhase,
        pitch_table::{PitchTable, REST_NOTE},
    },
};

/*
Pitch and Glide
===============

Turns a target note into the DAC code for one oscillator, sliding between
notes when glide is on.

Vocabulary
----------

  bend          Signed offset in bend increments. With the default of 100
                increments, +100 is a whole step up and -100 a whole step
                down. The instrument folds pitch-wheel and LFO vibrato into
                this single value.

  glide length  Ticks a glide takes, straight from the glide knob (0-1023).
                Zero disables glide.

  legato mode   Glide only between overlapping notes. A note played after
                the previous one was released jumps straight to its pitch.


Glide
-----

A new target note starts a glide from wherever the output is now:

    output = start + (end - start) * elapsed / length

computed in integers, truncating toward zero. The rate `(end - start) /
length` is fixed for the whole glide, and tick `length` lands exactly on the
end code. When the glide is over the output follows the resolved target
directly, bend included.

Bending during a glide re-targets the glide's end point every tick but does
not bend the path already travelled; a bend that changes mid-glide shows up
as a kink rather than a smoothly bent curve.
*/

/// Point `elapsed` ticks into a `length`-tick glide from `start` to `end`.
pub fn glide_point(start: u16, end: u16, elapsed: u16, length: u16) -> u16 {
    if length == 0 {
        return end;
    }
    let span = i32::from(end) - i32::from(start);
    let travelled = span * i32::from(elapsed.min(length)) / i32::from(length);
    (i32::from(start) + travelled) as u16
}

pub struct PitchEngine {
    table: PitchTable,
    bend_increments: f64,

    // Inputs
    glide_length: u16,
    legato: bool,
    pitch_bend: i32,
    notes_full: bool,

    // Glide state
    target_note: Option<u8>,
    out_pitch: u16,
    start_pitch: u16,
    end_pitch: u16,
    glide_elapsed: u16,
    gliding: bool,

    previous_phase: EnvelopePhase,
    current_phase: EnvelopePhase,
}

impl Default for PitchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchEngine {
    pub fn new() -> Self {
        Self::with_table(PitchTable::default(), &EngineConfig::default())
    }

    pub fn with_table(table: PitchTable, config: &EngineConfig) -> Self {
        let rest = table.code(REST_NOTE);
        Self {
            table,
            bend_increments: f64::from(config.bend_increments),

            glide_length: 0,
            legato: false,
            pitch_bend: 0,
            notes_full: false,

            target_note: None,
            out_pitch: rest,
            start_pitch: rest,
            end_pitch: rest,
            glide_elapsed: 0,
            gliding: false,

            previous_phase: EnvelopePhase::Off,
            current_phase: EnvelopePhase::Off,
        }
    }

    pub fn set_glide_length(&mut self, ticks: u16) {
        self.glide_length = ticks;
    }

    pub fn set_legato_mode(&mut self, legato: bool) {
        self.legato = legato;
    }

    pub fn set_pitch_bend(&mut self, offset: i32) {
        self.pitch_bend = offset;
    }

    /// Whether every note slot is held. Nothing drives this yet, so legato
    /// mode always takes the jump branch.
    pub fn set_notes_full(&mut self, full: bool) {
        self.notes_full = full;
    }

    /// DAC code for `note` with the current bend applied.
    pub fn resolve_pitch(&self, note: u8) -> u16 {
        if self.pitch_bend == 0 {
            return self.table.code(note);
        }
        let bend = f64::from(self.pitch_bend) / self.bend_increments;
        self.table.bent_code(note, bend)
    }

    /// Advance the glide by one tick and return the output code.
    ///
    /// `phase` is the owning voice's envelope phase, tracked to spot
    /// retriggers.
    pub fn tick(&mut self, note: u8, phase: EnvelopePhase) -> u16 {
        self.previous_phase = self.current_phase;
        self.current_phase = phase;

        if self.target_note != Some(note) {
            self.target_note = Some(note);
            self.glide_elapsed = 0;
            self.gliding = true;

            if self.legato && !self.notes_full {
                self.out_pitch = self.resolve_pitch(note);
                self.glide_elapsed = self.glide_length;
                self.start_pitch = self.out_pitch;
            } else {
                self.start_pitch = self.out_pitch;
                self.end_pitch = self.resolve_pitch(note);
            }
        }

        if self.gliding && self.glide_elapsed < self.glide_length {
            self.glide_elapsed += 1;
            self.end_pitch = self.resolve_pitch(note);
            self.out_pitch = glide_point(
                self.start_pitch,
                self.end_pitch,
                self.glide_elapsed,
                self.glide_length,
            );
        } else {
            self.out_pitch = self.resolve_pitch(note);
            self.end_pitch = self.out_pitch;
            self.glide_elapsed = self.glide_elapsed.min(self.glide_length);
            self.gliding = false;
        }

        self.out_pitch
    }

    pub fn pitch(&self) -> u16 {
        self.out_pitch
    }

    pub fn is_gliding(&self) -> bool {
        self.gliding
    }

    pub fn glide_elapsed(&self) -> u16 {
        self.glide_elapsed
    }

    pub fn target_note(&self) -> Option<u8> {
        self.target_note
    }

    /// True on the tick the owning envelope re-entered Attack.
    ///
    /// Like `set_notes_full`, nothing in the voice layer reads this yet; it
    /// is kept for drivers and traces that want to see retriggers, and it is
    /// the only consumer of the previous/current phase fields.
    pub fn retriggered(&self) -> bool {
        self.current_phase == EnvelopePhase::Attack
            && self.previous_phase != EnvelopePhase::Attack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::pitch_table::{HIGHEST_NOTE, TABLE_LEN},
        MAX_PITCH_CODE,
    };

    // note n sits at index n - 34, so its code is (n - 34) * 100
    static LINEAR: [u16; TABLE_LEN] = {
        let mut codes = [0u16; TABLE_LEN];
        let mut i = 0;
        while i < TABLE_LEN {
            codes[i] = (i as u16) * 100;
            i += 1;
        }
        codes
    };

    fn linear_engine() -> PitchEngine {
        PitchEngine::with_table(PitchTable::from_codes(&LINEAR), &EngineConfig::default())
    }

    #[test]
    fn glide_halfway_point() {
        assert_eq!(glide_point(500, 1500, 5, 10), 1000);
        assert_eq!(glide_point(1500, 500, 5, 10), 1000);
        // truncates toward zero in both directions
        assert_eq!(glide_point(0, 10, 1, 3), 3);
        assert_eq!(glide_point(10, 0, 1, 3), 7);
    }

    #[test]
    fn glide_reaches_midpoint_after_five_ticks() {
        let mut pitch = linear_engine();
        pitch.tick(39, EnvelopePhase::Sustain);
        assert_eq!(pitch.pitch(), 500);

        pitch.set_glide_length(10);
        for _ in 0..5 {
            pitch.tick(49, EnvelopePhase::Sustain);
        }
        assert_eq!(pitch.pitch(), 1000);
        assert!(pitch.is_gliding());
    }

    #[test]
    fn glide_completes_exactly_on_target() {
        for length in [1u16, 2, 7, 10, 333, 1023] {
            let mut pitch = PitchEngine::new();
            pitch.tick(40, EnvelopePhase::Sustain);
            pitch.set_glide_length(length);

            for _ in 0..length {
                pitch.tick(77, EnvelopePhase::Sustain);
            }
            assert_eq!(pitch.pitch(), pitch.resolve_pitch(77), "length {length}");
            assert!(pitch.glide_elapsed() <= length);
        }
    }

    #[test]
    fn zero_glide_jumps() {
        let mut pitch = PitchEngine::new();
        let code = pitch.tick(72, EnvelopePhase::Attack);
        assert_eq!(code, PitchTable::default().code(72));
        assert!(!pitch.is_gliding());
    }

    #[test]
    fn legato_mode_jumps_when_no_notes_held() {
        let mut pitch = linear_engine();
        pitch.tick(39, EnvelopePhase::Sustain);
        pitch.set_glide_length(100);
        pitch.set_legato_mode(true);

        assert_eq!(pitch.tick(49, EnvelopePhase::Attack), 1500);
    }

    #[test]
    fn legato_mode_glides_when_notes_full() {
        let mut pitch = linear_engine();
        pitch.tick(39, EnvelopePhase::Sustain);
        pitch.set_glide_length(10);
        pitch.set_legato_mode(true);
        pitch.set_notes_full(true);

        assert_eq!(pitch.tick(49, EnvelopePhase::Sustain), 600);
    }

    #[test]
    fn bend_is_monotonic_and_saturates() {
        let mut pitch = PitchEngine::new();
        let mut last = 0;
        for bend in 0..=3_000 {
            pitch.set_pitch_bend(bend);
            let code = pitch.resolve_pitch(HIGHEST_NOTE);
            assert!(code >= last, "bend {bend} went down");
            last = code;
        }
        assert_eq!(last, MAX_PITCH_CODE);
    }

    #[test]
    fn negative_bend_clamps_at_zero() {
        let mut pitch = PitchEngine::new();
        pitch.set_pitch_bend(-10_000);
        assert_eq!(pitch.resolve_pitch(36), 0);
    }

    #[test]
    fn bend_follows_after_glide_ends() {
        let mut pitch = linear_engine();
        pitch.tick(50, EnvelopePhase::Sustain);
        pitch.set_pitch_bend(50);
        // (16 + 0.5 * 2) * 100
        assert_eq!(pitch.tick(50, EnvelopePhase::Sustain), 1700);
    }

    #[test]
    fn detects_retrigger() {
        let mut pitch = PitchEngine::new();
        pitch.tick(60, EnvelopePhase::Release);
        pitch.tick(60, EnvelopePhase::Attack);
        assert!(pitch.retriggered());
        pitch.tick(60, EnvelopePhase::Attack);
        assert!(!pitch.retriggered());
    }
}
