use clap::{Parser, ValueEnum};
use cvgen::synth::VoiceMode;

/// Run the control-signal engine offline and print a per-tick CSV trace
#[derive(Parser, Debug)]
#[command(name = "cvgen")]
#[command(about = "Trace envelope, pitch and LFO control values tick by tick")]
#[command(version)]
pub struct Args {
    /// Attack knob (0-1023)
    #[arg(short, long, default_value = "0")]
    pub attack: u16,

    /// Decay knob (0-1023)
    #[arg(short, long, default_value = "0")]
    pub decay: u16,

    /// Sustain knob (0-1023)
    #[arg(short, long, default_value = "1023")]
    pub sustain: u16,

    /// Release knob (0-1023)
    #[arg(short, long, default_value = "0")]
    pub release: u16,

    /// Note-on velocity (1-127)
    #[arg(short, long, default_value = "100")]
    pub velocity: u8,

    /// MIDI note number
    #[arg(short, long, default_value = "60")]
    pub note: u8,

    /// Second note played at `--hold / 2` to show glide
    #[arg(long)]
    pub next_note: Option<u8>,

    /// Glide length in ticks (0-1023)
    #[arg(short, long, default_value = "0")]
    pub glide: u16,

    /// Glide only between overlapping notes
    #[arg(long)]
    pub legato: bool,

    /// Ticks between note-on and note-off
    #[arg(long, default_value = "1000")]
    pub hold: u64,

    /// Total ticks to run
    #[arg(short, long, default_value = "2000")]
    pub ticks: u64,

    /// LFO rate knob (0-1023)
    #[arg(long, default_value = "0")]
    pub lfo_rate: u16,

    /// LFO pitch depth knob (0-1023)
    #[arg(long, default_value = "0")]
    pub lfo_vco: u16,

    /// LFO filter depth knob (0-1023)
    #[arg(long, default_value = "0")]
    pub lfo_vcf: u16,

    /// Square LFO instead of sine
    #[arg(long)]
    pub square: bool,

    /// Voice allocation mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Poly1)]
    pub mode: ModeArg,

    /// Raw MIDI bytes as hex (e.g. "90 3C 64"), replacing the note arguments
    #[arg(long)]
    pub midi: Option<String>,

    /// MIDI channel to listen on (0-15)
    #[arg(long, default_value = "0")]
    pub channel: u8,

    /// Print every Nth tick
    #[arg(short, long, default_value = "1")]
    pub every: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Mono1,
    Mono2,
    Mono3,
    Mono6,
    Poly1,
    Poly2,
    Poly3,
}

impl From<ModeArg> for VoiceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Mono1 => VoiceMode::Mono1,
            ModeArg::Mono2 => VoiceMode::Mono2,
            ModeArg::Mono3 => VoiceMode::Mono3,
            ModeArg::Mono6 => VoiceMode::Mono6,
            ModeArg::Poly1 => VoiceMode::Poly1,
            ModeArg::Poly2 => VoiceMode::Poly2,
            ModeArg::Poly3 => VoiceMode::Poly3,
        }
    }
}

/// Parse whitespace or comma separated hex bytes.
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>, std::num::ParseIntError> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let chunk = chunk.trim_start_matches("0x").trim_start_matches("0X");
            u8::from_str_radix(chunk, 16)
        })
        .collect()
}
