use crate::{
    config::EngineConfig,
    dsp::{
        envelope::{EnvelopeEngine, EnvelopePhase},
        pitch::PitchEngine,
        pitch_table::{PitchTable, REST_NOTE},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Key held, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// One envelope + pitch pair driving one VCA and its oscillators.
pub struct Voice {
    note: u8,
    velocity: u8,
    state: VoiceState,
    age: u64,
    sustained: bool, // note-off arrived while the pedal was down
    envelope: EnvelopeEngine,
    pitch: PitchEngine,
    amplitude: u16,
    pitch_code: u16,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Voice {
    pub fn new(config: &EngineConfig) -> Self {
        let pitch = PitchEngine::with_table(PitchTable::default(), config);
        let pitch_code = pitch.pitch();
        Self {
            note: REST_NOTE,
            velocity: 0,
            state: VoiceState::Free,
            age: 0,
            sustained: false,
            envelope: EnvelopeEngine::with_config(config),
            pitch,
            amplitude: 0,
            pitch_code,
        }
    }

    /// Start a note from the top of the envelope.
    pub fn start(&mut self, note: u8, velocity: u8, age: u64) {
        self.note = note;
        self.velocity = velocity;
        self.state = VoiceState::Active;
        self.age = age;
        self.sustained = false;

        self.envelope.set_velocity(velocity);
        self.envelope.set_phase(EnvelopePhase::Attack);
    }

    /// Move a held voice to a new note without retriggering the envelope.
    /// A voice that is not held gets a fresh start instead.
    pub fn retarget(&mut self, note: u8, velocity: u8, age: u64) {
        if self.state != VoiceState::Active {
            self.start(note, velocity, age);
            return;
        }
        self.note = note;
        self.velocity = velocity;
        self.age = age;
        self.sustained = false;
        self.envelope.set_velocity(velocity);
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.sustained = false;
            self.envelope.set_phase(EnvelopePhase::Release);
        }
    }

    /// Defer a note-off until the sustain pedal lifts.
    pub fn hold_for_pedal(&mut self) {
        if self.state == VoiceState::Active {
            self.sustained = true;
        }
    }

    /// Advance envelope and pitch by one tick. Returns `(amplitude, pitch)`.
    pub fn tick(&mut self) -> (u16, u16) {
        let phase = self.envelope.phase();
        self.pitch_code = self.pitch.tick(self.note, phase);
        self.amplitude = self.envelope.tick();

        // If voice is releasing and envelope has finished, mark as free
        if self.state == VoiceState::Releasing && !self.envelope.is_active() {
            self.free();
        }

        (self.amplitude, self.pitch_code)
    }

    /// Cut the voice immediately (voice steal, mode change).
    pub fn silence(&mut self) {
        self.envelope.set_phase(EnvelopePhase::Off);
        self.amplitude = 0;
        self.free();
    }

    fn free(&mut self) {
        self.state = VoiceState::Free;
        self.sustained = false;
        self.velocity = 0;
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn phase(&self) -> EnvelopePhase {
        self.envelope.phase()
    }

    pub fn amplitude(&self) -> u16 {
        self.amplitude
    }

    pub fn pitch_code(&self) -> u16 {
        self.pitch_code
    }

    pub fn envelope(&self) -> &EnvelopeEngine {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut EnvelopeEngine {
        &mut self.envelope
    }

    pub fn pitch(&self) -> &PitchEngine {
        &self.pitch
    }

    pub fn pitch_mut(&mut self) -> &mut PitchEngine {
        &mut self.pitch
    }
}
