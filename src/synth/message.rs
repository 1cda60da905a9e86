use std::collections::VecDeque;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    io::panel::{Knob, Switch},
    synth::instrument::VoiceMode,
};

/// Everything the polling context can tell the tick context.
///
/// Each message sets one value; the instrument applies them in order at the
/// start of the next tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    /// Pitch wheel in bend increments (see `EngineConfig::bend_increments`).
    PitchBend { increments: i32 },
    /// Mod wheel, already stretched to knob range.
    ModWheel { value: u16 },
    SustainPedal { down: bool },
    Knob { knob: Knob, value: u16 },
    Switch { switch: Switch, on: bool },
    VoiceMode(VoiceMode),
    AllNotesOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

/// Scripted input for offline runs and tests.
impl MessageReceiver for VecDeque<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        self.pop_front()
    }
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}

/// Polling-context side of the control channel.
#[cfg(feature = "rtrb")]
pub struct ControlHandle {
    tx: Producer<ControlMessage>,
}

#[cfg(feature = "rtrb")]
impl ControlHandle {
    /// Queue a message for the next tick. A full queue drops it.
    pub fn send(&mut self, msg: ControlMessage) -> bool {
        match self.tx.push(msg) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("control queue full, dropping {msg:?}");
                false
            }
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) -> bool {
        self.send(ControlMessage::NoteOn { note, velocity })
    }

    pub fn note_off(&mut self, note: u8) -> bool {
        self.send(ControlMessage::NoteOff { note })
    }

    pub fn knob(&mut self, knob: Knob, raw: u16) -> bool {
        self.send(knob.message(raw))
    }

    pub fn switch(&mut self, switch: Switch, on: bool) -> bool {
        self.send(switch.message(on))
    }

    /// Free slots left in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }
}

/// Create a bounded control channel with room for `capacity` messages.
#[cfg(feature = "rtrb")]
pub fn control_channel(capacity: usize) -> (ControlHandle, Consumer<ControlMessage>) {
    let (tx, rx) = RingBuffer::<ControlMessage>::new(capacity);
    (ControlHandle { tx }, rx)
}

#[cfg(all(test, feature = "rtrb"))]
mod tests {
    use super::*;

    #[test]
    fn channel_delivers_in_order() {
        let (mut handle, mut rx) = control_channel(4);
        assert!(handle.note_on(60, 100));
        assert!(handle.note_off(60));

        assert_eq!(
            MessageReceiver::pop(&mut rx),
            Some(ControlMessage::NoteOn {
                note: 60,
                velocity: 100
            })
        );
        assert_eq!(
            MessageReceiver::pop(&mut rx),
            Some(ControlMessage::NoteOff { note: 60 })
        );
        assert_eq!(MessageReceiver::pop(&mut rx), None);
    }

    #[test]
    fn full_channel_drops_messages() {
        let (mut handle, mut rx) = control_channel(2);
        assert!(handle.send(ControlMessage::AllNotesOff));
        assert!(handle.send(ControlMessage::AllNotesOff));
        assert_eq!(handle.slots(), 0);
        assert!(!handle.note_on(60, 1));

        let mut received = 0;
        while MessageReceiver::pop(&mut rx).is_some() {
            received += 1;
        }
        assert_eq!(received, 2);
    }
}
