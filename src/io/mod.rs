// Purpose - external interfaces: MIDI bytes, panel readings, buffering

pub mod converter;
pub mod midi;
pub mod panel;
pub mod queue;
