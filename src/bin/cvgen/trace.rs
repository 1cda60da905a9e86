use std::io::{self, Write};

use cvgen::synth::TickOutput;

pub const HEADER: &str = "tick,amplitude,phase,pitch,lfo_vco,lfo_vcf,active";

/// One CSV row for voice slot 0.
pub fn write_row<W: Write>(
    out: &mut W,
    tick: u64,
    frame: &TickOutput,
    active: usize,
) -> io::Result<()> {
    writeln!(
        out,
        "{},{},{:?},{},{:.4},{:.4},{}",
        tick,
        frame.amplitudes[0],
        frame.phases[0],
        frame.pitches[0],
        frame.lfo_vco,
        frame.lfo_vcf,
        active
    )
}

#[cfg(test)]
mod tests {
    use cvgen::{dsp::EnvelopePhase, synth::VoiceMode};

    use super::*;

    #[test]
    fn row_matches_header_columns() {
        let frame = TickOutput {
            amplitudes: [3200, 0, 0, 0, 0, 0],
            pitches: [1500, 0, 0, 0, 0, 0],
            phases: [EnvelopePhase::Decay; 6],
            lfo_vco: 0.5,
            lfo_vcf: -0.25,
            voice_mode: VoiceMode::Poly1,
        };
        let mut buf = Vec::new();
        write_row(&mut buf, 7, &frame, 1).unwrap();
        let row = String::from_utf8(buf).unwrap();
        assert_eq!(row, "7,3200,Decay,1500,0.5000,-0.2500,1\n");
        assert_eq!(
            row.trim_end().split(',').count(),
            HEADER.split(',').count()
        );
    }
}
