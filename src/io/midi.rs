use crate::io::queue::BoundedQueue;

/*
MIDI Byte Decoding
==================

MIDI arrives one byte at a time from a serial port. Each channel message is a
status byte followed by one or two data bytes:

    status      1sss cccc   s = message type, c = channel (0-15)
    data        0ddd dddd   7-bit payload

    type   data bytes   meaning
    0x8n   key, vel     note off
    0x9n   key, vel     note on (vel 0 means note off)
    0xBn   ctrl, val    control change (1 = mod wheel, 64 = sustain pedal)
    0xCn   program      program change
    0xEn   lsb, msb     pitch bend, 14 bits centred on 8192

The decoder is a small state machine: wait for a status byte on our channel,
then collect the data bytes. Once a message completes, further data bytes
reuse the last status ("running status"), which keyboards use to save
bandwidth on note streams.

Anything we do not handle (other channels, aftertouch, system messages) is
skipped until the next status byte. System real-time bytes (0xF8-0xFF) may
appear anywhere, even between data bytes, and are ignored without disturbing
the message in flight.
*/

/// Raw bytes buffered between serial reads and decoding. 3 bytes per
/// message, so this holds 20 messages.
pub const MIDI_BUFFER_SIZE: usize = 60;

pub const CONTROL_MOD_WHEEL: u8 = 0x01;
pub const CONTROL_SUSTAIN_PEDAL: u8 = 0x40;

const PITCH_BEND_CENTER: i16 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    NoteOff,
    NoteOn,
    ControlChange,
    ProgramChange,
    PitchBend,
}

impl Status {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte >> 4 {
            0x8 => Some(Status::NoteOff),
            0x9 => Some(Status::NoteOn),
            0xB => Some(Status::ControlChange),
            0xC => Some(Status::ProgramChange),
            0xE => Some(Status::PitchBend),
            _ => None,
        }
    }

    fn data_len(self) -> u8 {
        match self {
            Status::ProgramChange => 1,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    First,
    Second,
}

/// Byte-at-a-time decoder for one MIDI channel.
#[derive(Debug, Clone)]
pub struct MidiParser {
    channel: u8,
    status: Option<Status>,
    awaiting: Awaiting,
    data1: u8,
}

impl MidiParser {
    pub fn new(channel: u8) -> Self {
        Self {
            channel: channel & 0x0F,
            status: None,
            awaiting: Awaiting::First,
            data1: 0,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Listen on another channel. Any half-read message and the running
    /// status are dropped, since they belong to the old channel.
    pub fn set_channel(&mut self, channel: u8) {
        let channel = channel & 0x0F;
        if channel != self.channel {
            log::debug!("MIDI channel {} -> {}", self.channel, channel);
        }
        self.channel = channel;
        self.status = None;
        self.awaiting = Awaiting::First;
    }

    /// Feed one byte. Returns an event when the byte completes a message.
    pub fn push_byte(&mut self, byte: u8) -> Option<MidiEvent> {
        if byte >= 0xF8 {
            return None;
        }

        if byte & 0x80 != 0 {
            self.awaiting = Awaiting::First;
            self.status = None;

            if byte >= 0xF0 {
                log::trace!("skipping system message {byte:#04x}");
                return None;
            }
            if byte & 0x0F != self.channel {
                log::trace!("skipping status {byte:#04x} for another channel");
                return None;
            }
            self.status = Status::from_byte(byte);
            if self.status.is_none() {
                log::trace!("skipping unsupported status {byte:#04x}");
            }
            return None;
        }

        let status = self.status?;
        match self.awaiting {
            Awaiting::First if status.data_len() == 1 => Some(self.finish(status, byte, 0)),
            Awaiting::First => {
                self.data1 = byte;
                self.awaiting = Awaiting::Second;
                None
            }
            Awaiting::Second => {
                self.awaiting = Awaiting::First;
                Some(self.finish(status, self.data1, byte))
            }
        }
    }

    fn finish(&self, status: Status, data1: u8, data2: u8) -> MidiEvent {
        let channel = self.channel;
        match status {
            Status::NoteOn if data2 == 0 => MidiEvent::NoteOff {
                channel,
                key: data1,
                velocity: 0,
            },
            Status::NoteOn => MidiEvent::NoteOn {
                channel,
                key: data1,
                velocity: data2,
            },
            Status::NoteOff => MidiEvent::NoteOff {
                channel,
                key: data1,
                velocity: data2,
            },
            Status::ControlChange => MidiEvent::ControlChange {
                channel,
                controller: data1,
                value: data2,
            },
            Status::ProgramChange => MidiEvent::ProgramChange {
                channel,
                program: data1,
            },
            Status::PitchBend => {
                let raw = (i16::from(data2) << 7) | i16::from(data1);
                MidiEvent::PitchBend {
                    channel,
                    value: raw - PITCH_BEND_CENTER,
                }
            }
        }
    }
}

/// Serial-side byte buffer feeding a [`MidiParser`].
///
/// `receive` runs wherever bytes arrive; `next_event` runs in the polling
/// loop. Bytes that arrive while the buffer is full are dropped.
#[derive(Debug, Clone)]
pub struct MidiInput {
    buffer: BoundedQueue<u8, MIDI_BUFFER_SIZE>,
    parser: MidiParser,
}

impl MidiInput {
    pub fn new(channel: u8) -> Self {
        Self {
            buffer: BoundedQueue::new(),
            parser: MidiParser::new(channel),
        }
    }

    /// Buffer one raw byte. Returns false if it was dropped.
    pub fn receive(&mut self, byte: u8) -> bool {
        self.buffer.push(byte)
    }

    /// Decode buffered bytes until one event completes or the buffer runs dry.
    pub fn next_event(&mut self) -> Option<MidiEvent> {
        while !self.buffer.is_empty() {
            let byte = self.buffer.pop();
            if let Some(event) = self.parser.push_byte(byte) {
                return Some(event);
            }
        }
        None
    }

    pub fn channel(&self) -> u8 {
        self.parser.channel()
    }

    pub fn set_channel(&mut self, channel: u8) {
        self.parser.set_channel(channel);
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
