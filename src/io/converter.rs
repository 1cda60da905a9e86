use crate::{
    io::midi::{MidiEvent, CONTROL_MOD_WHEEL, CONTROL_SUSTAIN_PEDAL},
    synth::message::ControlMessage,
    KNOB_MAX,
};

const BEND_HALF_RANGE: i32 = 8192;

/// Translate a decoded MIDI event into the control message the instrument
/// understands. `bend_increments` is the bend offset of a full whole step.
pub fn midi_to_control(
    midi: MidiEvent,
    channel_filter: u8,
    bend_increments: u16,
) -> Option<ControlMessage> {
    match midi {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } if channel == channel_filter => Some(ControlMessage::NoteOn {
            note: key,
            velocity,
        }),
        MidiEvent::NoteOff { channel, key, .. } if channel == channel_filter => {
            Some(ControlMessage::NoteOff { note: key })
        }
        MidiEvent::PitchBend { channel, value } if channel == channel_filter => {
            Some(ControlMessage::PitchBend {
                increments: bend_to_increments(value, bend_increments),
            })
        }
        MidiEvent::ControlChange {
            channel,
            controller,
            value,
        } if channel == channel_filter => match controller {
            CONTROL_MOD_WHEEL => Some(ControlMessage::ModWheel {
                value: seven_bit_to_knob(value),
            }),
            CONTROL_SUSTAIN_PEDAL => Some(ControlMessage::SustainPedal { down: value > 0x3F }),
            _ => None,
        },
        _ => None,
    }
}

/// Scale a centred 14-bit bend to bend increments (full deflection is one
/// whole step).
pub fn bend_to_increments(value: i16, bend_increments: u16) -> i32 {
    i32::from(value) * i32::from(bend_increments) / BEND_HALF_RANGE
}

/// Stretch a 7-bit controller value over the knob range.
pub fn seven_bit_to_knob(value: u8) -> u16 {
    (u32::from(value.min(127)) * u32::from(KNOB_MAX) / 127) as u16
}
