//! Front-panel controls and their mapping onto control messages.
//!
//! Raw readings come from an external scanner: 10-bit knob values and
//! on/off switches. This is the layer that clamps readings into range; the
//! generators downstream assume it has.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    synth::{instrument::VoiceMode, message::ControlMessage},
    KNOB_MAX,
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knob {
    Attack,
    Decay,
    Sustain,
    Release,
    Glide,
    LfoVcoAmount,
    LfoVcfAmount,
    LfoRate,
}

impl Knob {
    pub const ALL: [Knob; 8] = [
        Knob::Attack,
        Knob::Decay,
        Knob::Sustain,
        Knob::Release,
        Knob::Glide,
        Knob::LfoVcoAmount,
        Knob::LfoVcfAmount,
        Knob::LfoRate,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn message(self, raw: u16) -> ControlMessage {
        ControlMessage::Knob {
            knob: self,
            value: raw.min(KNOB_MAX),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    /// On selects the sine LFO, off the square.
    LfoSine,
    /// On restricts glide to overlapping notes.
    LegatoGlide,
    ModWheelToRate,
    ModWheelToVcf,
    ModWheelToVco,
    /// On selects polyphonic voices, off a single mono voice.
    Poly,
    // Oscillator stacking, the widest engaged stack wins
    Stack2,
    Stack3,
    Stack6,
    // Binary MIDI channel selector
    MidiChannelBit0,
    MidiChannelBit1,
    MidiChannelBit2,
    MidiChannelBit3,
}

impl Switch {
    pub const ALL: [Switch; 13] = [
        Switch::LfoSine,
        Switch::LegatoGlide,
        Switch::ModWheelToRate,
        Switch::ModWheelToVcf,
        Switch::ModWheelToVco,
        Switch::Poly,
        Switch::Stack2,
        Switch::Stack3,
        Switch::Stack6,
        Switch::MidiChannelBit0,
        Switch::MidiChannelBit1,
        Switch::MidiChannelBit2,
        Switch::MidiChannelBit3,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn message(self, on: bool) -> ControlMessage {
        ControlMessage::Switch { switch: self, on }
    }

    /// Bit position for the MIDI channel selector switches.
    pub fn channel_bit(self) -> Option<u8> {
        match self {
            Switch::MidiChannelBit0 => Some(0),
            Switch::MidiChannelBit1 => Some(1),
            Switch::MidiChannelBit2 => Some(2),
            Switch::MidiChannelBit3 => Some(3),
            _ => None,
        }
    }

    pub fn is_mode(self) -> bool {
        matches!(
            self,
            Switch::Poly | Switch::Stack2 | Switch::Stack3 | Switch::Stack6
        )
    }
}

/// Positions of the mono/poly and oscillator-stack switches.
///
/// Mono stacks 1, 2, 3 or 6 oscillators on one voice. Poly stacks 1, 2 or 3;
/// a six-oscillator stack leaves room for one voice only, so `Stack6` has no
/// effect in poly.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeSwitches {
    pub poly: bool,
    pub stack2: bool,
    pub stack3: bool,
    pub stack6: bool,
}

impl ModeSwitches {
    /// Switch positions that select `mode`.
    pub fn from_mode(mode: VoiceMode) -> Self {
        let mut switches = Self {
            poly: !mode.is_mono(),
            ..Self::default()
        };
        match mode.oscillators_per_voice() {
            2 => switches.stack2 = true,
            3 => switches.stack3 = true,
            6 => switches.stack6 = true,
            _ => {}
        }
        switches
    }

    /// Record one switch. Returns false if it isn't a mode switch.
    pub fn set(&mut self, switch: Switch, on: bool) -> bool {
        match switch {
            Switch::Poly => self.poly = on,
            Switch::Stack2 => self.stack2 = on,
            Switch::Stack3 => self.stack3 = on,
            Switch::Stack6 => self.stack6 = on,
            _ => return false,
        }
        true
    }

    pub fn voice_mode(self) -> VoiceMode {
        match (self.poly, self.stack6, self.stack3, self.stack2) {
            (false, true, _, _) => VoiceMode::Mono6,
            (false, false, true, _) => VoiceMode::Mono3,
            (false, false, false, true) => VoiceMode::Mono2,
            (false, false, false, false) => VoiceMode::Mono1,
            (true, _, true, _) => VoiceMode::Poly3,
            (true, _, false, true) => VoiceMode::Poly2,
            (true, _, false, false) => VoiceMode::Poly1,
        }
    }
}

/// Which LFO parameters the mod wheel overrides.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModWheelRoutes {
    pub rate: bool,
    pub vcf: bool,
    pub vco: bool,
}

impl ModWheelRoutes {
    /// Knobs the wheel currently stands in for.
    pub fn targets(self) -> impl Iterator<Item = Knob> {
        [
            (self.rate, Knob::LfoRate),
            (self.vcf, Knob::LfoVcfAmount),
            (self.vco, Knob::LfoVcoAmount),
        ]
        .into_iter()
        .filter_map(|(enabled, knob)| enabled.then_some(knob))
    }
}

/// Readings that move less than this are treated as ADC noise.
pub const KNOB_JITTER: u16 = 2;

/// Last reported panel state. Turns a full scan into only the messages
/// that changed, so the control queue is not flooded every scan.
///
/// Mode switches are folded into a single `VoiceMode` message. The MIDI
/// channel switches produce no message; the polling loop reads
/// [`PanelState::midi_channel`] and hands it to its `MidiInput`.
#[derive(Debug, Clone)]
pub struct PanelState {
    knobs: [Option<u16>; Knob::ALL.len()],
    switches: [Option<bool>; Switch::ALL.len()],
    mode: ModeSwitches,
    midi_channel: u8,
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelState {
    pub fn new() -> Self {
        Self {
            knobs: [None; Knob::ALL.len()],
            switches: [None; Switch::ALL.len()],
            mode: ModeSwitches::default(),
            midi_channel: 0,
        }
    }

    /// Record a knob reading; returns a message if it moved past the jitter
    /// threshold (or is the first reading for that knob).
    pub fn knob(&mut self, knob: Knob, raw: u16) -> Option<ControlMessage> {
        let raw = raw.min(KNOB_MAX);
        let slot = &mut self.knobs[knob.index()];
        match *slot {
            Some(last) if last.abs_diff(raw) < KNOB_JITTER => None,
            _ => {
                *slot = Some(raw);
                Some(knob.message(raw))
            }
        }
    }

    /// Record a switch position; returns a message if it changed.
    pub fn switch(&mut self, switch: Switch, on: bool) -> Option<ControlMessage> {
        let slot = &mut self.switches[switch.index()];
        if *slot == Some(on) {
            return None;
        }
        *slot = Some(on);

        if let Some(bit) = switch.channel_bit() {
            let mask = 1u8 << bit;
            if on {
                self.midi_channel |= mask;
            } else {
                self.midi_channel &= !mask;
            }
            return None;
        }
        if self.mode.set(switch, on) {
            return Some(ControlMessage::VoiceMode(self.mode.voice_mode()));
        }
        Some(switch.message(on))
    }

    /// Channel (0-15) selected by the channel switches. Unread bits count as off.
    pub fn midi_channel(&self) -> u8 {
        self.midi_channel
    }

    pub fn voice_mode(&self) -> VoiceMode {
        self.mode.voice_mode()
    }
}
