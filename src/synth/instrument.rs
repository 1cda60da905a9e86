/*
    The instrument is the tick-context owner of every generator.

    Six oscillators are shared between up to six voices:

        Mono1  [v0]                    one oscillator, five idle
        Mono2  [v0 v0]                 two stacked oscillators
        Mono3  [v0 v0 v0]
        Mono6  [v0 v0 v0 v0 v0 v0]
        Poly1  [v0 v1 v2 v3 v4 v5]     six notes, one oscillator each
        Poly2  [v0 v0 v1 v1 v2 v2]     three notes, two oscillators each
        Poly3  [v0 v0 v0 v1 v1 v1]     two notes, three oscillators each

    Per tick:

        1. drain the control queue (last writer wins)
        2. advance the LFO
        3. fold LFO VCO output into the MIDI bend (vibrato rides the bend path)
        4. tick every voice slot the mode uses
        5. publish a TickOutput for the DAC drivers

    Nothing in `tick` allocates or blocks. Logging happens only at
    construction.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::{ConfigError, EngineConfig},
    dsp::{
        envelope::EnvelopePhase,
        lfo::{LfoShape, ModulationEngine},
        pitch_table::PitchTable,
    },
    io::{
        panel::{Knob, ModWheelRoutes, ModeSwitches, Switch},
        queue::BoundedStack,
    },
    synth::{
        message::{ControlMessage, MessageReceiver},
        voice::{Voice, VoiceState},
    },
};

pub const MAX_VOICES: usize = 6;
pub const OSCILLATORS: usize = 6;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoiceMode {
    Mono1,
    Mono2,
    Mono3,
    Mono6,
    #[default]
    Poly1,
    Poly2,
    Poly3,
}

impl VoiceMode {
    pub const ALL: [VoiceMode; 7] = [
        VoiceMode::Mono1,
        VoiceMode::Mono2,
        VoiceMode::Mono3,
        VoiceMode::Mono6,
        VoiceMode::Poly1,
        VoiceMode::Poly2,
        VoiceMode::Poly3,
    ];

    /// Number of independent notes.
    pub fn voices(self) -> usize {
        match self {
            VoiceMode::Mono1 | VoiceMode::Mono2 | VoiceMode::Mono3 | VoiceMode::Mono6 => 1,
            VoiceMode::Poly1 => 6,
            VoiceMode::Poly2 => 3,
            VoiceMode::Poly3 => 2,
        }
    }

    pub fn oscillators_per_voice(self) -> usize {
        match self {
            VoiceMode::Mono1 | VoiceMode::Poly1 => 1,
            VoiceMode::Mono2 | VoiceMode::Poly2 => 2,
            VoiceMode::Mono3 | VoiceMode::Poly3 => 3,
            VoiceMode::Mono6 => 6,
        }
    }

    pub fn is_mono(self) -> bool {
        self.voices() == 1
    }

    /// Voice slot driving oscillator `osc`, if the mode uses it.
    pub fn voice_for_oscillator(self, osc: usize) -> Option<usize> {
        let per_voice = self.oscillators_per_voice();
        (osc < per_voice * self.voices()).then_some(osc / per_voice)
    }
}

/// Control values produced by one tick.
///
/// Arrays are indexed by voice slot; slots the current mode doesn't use hold
/// amplitude 0 and phase `Off`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    pub amplitudes: [u16; MAX_VOICES],
    pub pitches: [u16; MAX_VOICES],
    pub phases: [EnvelopePhase; MAX_VOICES],
    pub lfo_vco: f32,
    pub lfo_vcf: f32,
    pub voice_mode: VoiceMode,
}

impl TickOutput {
    pub fn oscillator_pitch(&self, osc: usize) -> Option<u16> {
        self.voice_mode
            .voice_for_oscillator(osc)
            .map(|voice| self.pitches[voice])
    }

    pub fn oscillator_amplitude(&self, osc: usize) -> Option<u16> {
        self.voice_mode
            .voice_for_oscillator(osc)
            .map(|voice| self.amplitudes[voice])
    }
}

// Panel readings for the LFO knobs the mod wheel can stand in for
#[derive(Debug, Clone, Copy, Default)]
struct LfoKnobs {
    rate: u16,
    vco: u16,
    vcf: u16,
}

pub struct Instrument<R: MessageReceiver> {
    voices: [Voice; MAX_VOICES],
    lfo: ModulationEngine,
    rx: R,

    mode: VoiceMode,
    mode_switches: ModeSwitches,
    lfo_shape: LfoShape,
    lfo_knobs: LfoKnobs,
    mod_wheel: u16,
    routes: ModWheelRoutes,

    sustain_pedal: bool,
    deferred: BoundedStack<u8, MAX_VOICES>,

    midi_bend: i32,
    bend_increments: u16,

    note_counter: u64,
    tick_counter: u64,
}

impl<R: MessageReceiver> Instrument<R> {
    pub fn new(config: &EngineConfig, rx: R) -> Result<Self, ConfigError> {
        config.validate()?;

        log::info!(
            "instrument ready: {:?}, {} voice(s) x {} oscillator(s)",
            config.voice_mode,
            config.voice_mode.voices(),
            config.voice_mode.oscillators_per_voice()
        );

        Ok(Self {
            voices: core::array::from_fn(|_| Voice::new(config)),
            lfo: ModulationEngine::with_config(config),
            rx,

            mode: config.voice_mode,
            mode_switches: ModeSwitches::from_mode(config.voice_mode),
            lfo_shape: LfoShape::default(),
            lfo_knobs: LfoKnobs::default(),
            mod_wheel: 0,
            routes: ModWheelRoutes::default(),

            sustain_pedal: false,
            deferred: BoundedStack::new(),

            midi_bend: 0,
            bend_increments: config.bend_increments,

            note_counter: 0,
            tick_counter: 0,
        })
    }

    pub fn tick(&mut self) -> TickOutput {
        while let Some(msg) = self.rx.pop() {
            self.apply(msg);
        }

        let (lfo_vco, lfo_vcf) = self.lfo.tick(self.lfo_shape);
        let vibrato = (lfo_vco * f32::from(self.bend_increments)) as i32;
        let bend = self.midi_bend.saturating_add(vibrato);

        let mut out = TickOutput {
            amplitudes: [0; MAX_VOICES],
            pitches: [0; MAX_VOICES],
            phases: [EnvelopePhase::Off; MAX_VOICES],
            lfo_vco,
            lfo_vcf,
            voice_mode: self.mode,
        };

        let used = self.mode.voices();
        for (slot, voice) in self.voices.iter_mut().enumerate().take(used) {
            voice.pitch_mut().set_pitch_bend(bend);
            if voice.is_active() {
                let (amplitude, pitch) = voice.tick();
                out.amplitudes[slot] = amplitude;
                out.pitches[slot] = pitch;
            } else {
                out.pitches[slot] = voice.pitch_code();
            }
            out.phases[slot] = voice.phase();
        }

        self.tick_counter += 1;
        out
    }

    /// Apply one control message immediately, outside the queue.
    pub fn apply(&mut self, msg: ControlMessage) {
        match msg {
            ControlMessage::NoteOn { note, velocity: 0 } => self.note_off(note),
            ControlMessage::NoteOn { note, velocity } => self.note_on(note, velocity),
            ControlMessage::NoteOff { note } => self.note_off(note),
            ControlMessage::PitchBend { increments } => self.midi_bend = increments,
            ControlMessage::ModWheel { value } => {
                self.mod_wheel = value;
                self.refresh_lfo();
            }
            ControlMessage::SustainPedal { down } => self.set_sustain_pedal(down),
            ControlMessage::Knob { knob, value } => self.set_knob(knob, value),
            ControlMessage::Switch { switch, on } => self.set_switch(switch, on),
            ControlMessage::VoiceMode(mode) => {
                self.mode_switches = ModeSwitches::from_mode(mode);
                self.set_voice_mode(mode);
            }
            ControlMessage::AllNotesOff => {
                self.sustain_pedal = false;
                self.drain_deferred();
                for voice in &mut self.voices {
                    voice.release();
                }
            }
        }
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        let note = PitchTable::clamp_note(note);
        self.note_counter += 1;
        let age = self.note_counter;

        if self.mode.is_mono() {
            // Held key: slide over without a retrigger
            self.voices[0].retarget(note, velocity, age);
            return;
        }

        let slot = self.allocate_voice();
        let voice = &mut self.voices[slot];
        if !voice.is_free() {
            voice.silence();
        }
        voice.start(note, velocity, age);
    }

    fn note_off(&mut self, note: u8) {
        let note = PitchTable::clamp_note(note);
        let used = self.mode.voices();
        let Some(slot) = self.voices[..used]
            .iter()
            .position(|v| v.state() == VoiceState::Active && v.note() == note && !v.is_sustained())
        else {
            return;
        };

        if self.sustain_pedal {
            self.voices[slot].hold_for_pedal();
            self.defer_release(slot);
        } else {
            self.voices[slot].release();
        }
    }

    fn allocate_voice(&self) -> usize {
        let used = &self.voices[..self.mode.voices()];

        // First pass: free voice
        if let Some(slot) = used.iter().position(|v| v.is_free()) {
            return slot;
        }

        // Second pass: oldest releasing voice
        let releasing = used
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .map(|(slot, _)| slot);
        if let Some(slot) = releasing {
            return slot;
        }

        // Last resort: oldest held voice
        used.iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age())
            .map(|(slot, _)| slot)
            .unwrap_or(0)
    }

    fn set_sustain_pedal(&mut self, down: bool) {
        self.sustain_pedal = down;
        if !down {
            self.drain_deferred();
        }
    }

    fn defer_release(&mut self, slot: usize) {
        if self.deferred.push(slot as u8) {
            return;
        }
        // Full of stale slots (voices restarted under the pedal): rebuild.
        while !self.deferred.is_empty() {
            self.deferred.pop();
        }
        for (idx, voice) in self.voices.iter().enumerate() {
            if voice.is_sustained() {
                self.deferred.push(idx as u8);
            }
        }
    }

    fn drain_deferred(&mut self) {
        while !self.deferred.is_empty() {
            let slot = usize::from(self.deferred.pop());
            if let Some(voice) = self.voices.get_mut(slot) {
                if voice.is_sustained() {
                    voice.release();
                }
            }
        }
    }

    fn set_knob(&mut self, knob: Knob, value: u16) {
        match knob {
            Knob::Attack => self.each_voice(|v| v.envelope_mut().set_attack(value)),
            Knob::Decay => self.each_voice(|v| v.envelope_mut().set_decay(value)),
            Knob::Sustain => self.each_voice(|v| v.envelope_mut().set_sustain(value)),
            Knob::Release => self.each_voice(|v| v.envelope_mut().set_release(value)),
            Knob::Glide => self.each_voice(|v| v.pitch_mut().set_glide_length(value)),
            Knob::LfoRate => {
                self.lfo_knobs.rate = value;
                self.refresh_lfo();
            }
            Knob::LfoVcoAmount => {
                self.lfo_knobs.vco = value;
                self.refresh_lfo();
            }
            Knob::LfoVcfAmount => {
                self.lfo_knobs.vcf = value;
                self.refresh_lfo();
            }
        }
    }

    fn set_switch(&mut self, switch: Switch, on: bool) {
        match switch {
            Switch::LfoSine => self.lfo_shape = LfoShape::from_switch(on),
            Switch::LegatoGlide => self.each_voice(|v| v.pitch_mut().set_legato_mode(on)),
            Switch::ModWheelToRate => {
                self.routes.rate = on;
                self.refresh_lfo();
            }
            Switch::ModWheelToVcf => {
                self.routes.vcf = on;
                self.refresh_lfo();
            }
            Switch::ModWheelToVco => {
                self.routes.vco = on;
                self.refresh_lfo();
            }
            Switch::Poly | Switch::Stack2 | Switch::Stack3 | Switch::Stack6 => {
                self.mode_switches.set(switch, on);
                self.set_voice_mode(self.mode_switches.voice_mode());
            }
            // Channel selection belongs to the MIDI input, not the tick
            Switch::MidiChannelBit0
            | Switch::MidiChannelBit1
            | Switch::MidiChannelBit2
            | Switch::MidiChannelBit3 => {}
        }
    }

    // Routed LFO parameters follow the wheel, the rest follow the panel.
    fn refresh_lfo(&mut self) {
        let mut knobs = self.lfo_knobs;
        for target in self.routes.targets() {
            match target {
                Knob::LfoRate => knobs.rate = self.mod_wheel,
                Knob::LfoVcoAmount => knobs.vco = self.mod_wheel,
                Knob::LfoVcfAmount => knobs.vcf = self.mod_wheel,
                _ => {}
            }
        }
        self.lfo.set_record_length(knobs.rate);
        self.lfo.set_vco_depth(knobs.vco);
        self.lfo.set_vcf_depth(knobs.vcf);
    }

    fn set_voice_mode(&mut self, mode: VoiceMode) {
        if mode == self.mode {
            return;
        }
        for voice in &mut self.voices {
            voice.silence();
        }
        while !self.deferred.is_empty() {
            self.deferred.pop();
        }
        self.mode = mode;
    }

    fn each_voice(&mut self, mut f: impl FnMut(&mut Voice)) {
        for voice in &mut self.voices {
            f(voice);
        }
    }

    pub fn voice(&self, slot: usize) -> Option<&Voice> {
        self.voices.get(slot)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices[..self.mode.voices()]
    }

    pub fn active_voices(&self) -> usize {
        self.voices().iter().filter(|v| v.is_active()).count()
    }

    pub fn voice_mode(&self) -> VoiceMode {
        self.mode
    }

    pub fn lfo(&self) -> &ModulationEngine {
        &self.lfo
    }

    pub fn lfo_shape(&self) -> LfoShape {
        self.lfo_shape
    }

    pub fn sustain_pedal(&self) -> bool {
        self.sustain_pedal
    }

    pub fn midi_bend(&self) -> i32 {
        self.midi_bend
    }

    pub fn ticks(&self) -> u64 {
        self.tick_counter
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.rx
    }
}
