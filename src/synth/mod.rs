// Purpose: voices, control messages, and the per-tick instrument driver
// This layer sits above the dsp generators and owns one pair per voice

pub mod instrument;
pub mod message;
pub mod voice;

pub use instrument::{Instrument, TickOutput, VoiceMode, MAX_VOICES, OSCILLATORS};
pub use message::{ControlMessage, MessageReceiver};
#[cfg(feature = "rtrb")]
pub use message::{control_channel, ControlHandle};
pub use voice::{Voice, VoiceState};
