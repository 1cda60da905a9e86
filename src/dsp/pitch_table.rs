use crate::MAX_PITCH_CODE;

/*
Pitch Table
===========

The oscillators are exponential-converter VCOs driven by a 12-bit DAC. The
DAC code for a given note is not a straight line: it was measured per board
revision and stored as a table.

  note        MIDI note number. Only 36 (C2) through 85 (C#6) are playable.

  code        12-bit DAC value, 0 to 4095.

  padding     Two extra entries at each end of the table so that a whole-step
              bend from the lowest or highest note still has a neighbour to
              interpolate toward.


Memory Layout
-------------

    index:  0   1   2  ...  n  ...  53
            _   _  [36] ... [n] ... _
                        ^       ^
              note - 2 (bend -)   note + 2 (bend +)

A note lives at `note - LOWEST_NOTE + 2`. Bending interpolates toward the
entry two slots away in either direction: a whole step.
*/

/// Lowest playable MIDI note (C2).
pub const LOWEST_NOTE: u8 = 36;
/// Highest playable MIDI note (C#6).
pub const HIGHEST_NOTE: u8 = 85;
/// Default note a fresh pitch engine sits on (C4).
pub const REST_NOTE: u8 = 60;

const EDGE_PADDING: usize = 2;
/// Entries in a pitch table, padding included.
pub const TABLE_LEN: usize = (HIGHEST_NOTE - LOWEST_NOTE) as usize + 1 + 2 * EDGE_PADDING;

/// Calibration for revision 1.2 of the voice board.
static REV_1_2: [u16; TABLE_LEN] = [
    0, 0, //
    14, 27, 41, 55, 71, 88, 106, 126, 146, 168, 191, 215, // C2 - B2
    242, 270, 300, 331, 365, 400, 439, 479, 522, 568, 617, 669, // C3 - B3
    724, 784, 846, 913, 984, 1060, 1140, 1226, 1320, 1419, 1522, 1633, // C4 - B4
    1751, 1876, 2010, 2151, 2302, 2461, 2630, 2809, 3000, 3199, 3408, 3622, // C5 - B5
    3831, // C6
    3959, 4022, 4080, // C#6 and padding
];

/// Immutable note-to-DAC-code lookup, shared by every pitch engine.
#[derive(Debug, Clone, Copy)]
pub struct PitchTable {
    codes: &'static [u16; TABLE_LEN],
}

impl Default for PitchTable {
    fn default() -> Self {
        Self { codes: &REV_1_2 }
    }
}

impl PitchTable {
    /// Use a different board calibration. Codes must be non-decreasing.
    pub fn from_codes(codes: &'static [u16; TABLE_LEN]) -> Self {
        debug_assert!(codes.windows(2).all(|w| w[0] <= w[1]));
        Self { codes }
    }

    pub fn contains(note: u8) -> bool {
        (LOWEST_NOTE..=HIGHEST_NOTE).contains(&note)
    }

    /// Fold a note into the playable range. Callers do this before lookup.
    pub fn clamp_note(note: u8) -> u8 {
        note.clamp(LOWEST_NOTE, HIGHEST_NOTE)
    }

    fn index_of(note: u8) -> usize {
        debug_assert!(Self::contains(note), "note {note} outside pitch table");
        usize::from(Self::clamp_note(note) - LOWEST_NOTE) + EDGE_PADDING
    }

    /// Unbent code for a note.
    pub fn code(&self, note: u8) -> u16 {
        self.codes[Self::index_of(note)]
    }

    /// Code for a note bent by `bend` whole steps (-1.0 to 1.0 is one whole
    /// step each way). Larger bends extrapolate and saturate at the DAC
    /// limits.
    pub fn bent_code(&self, note: u8, bend: f64) -> u16 {
        let index = Self::index_of(note);
        let pure = self.codes[index];
        if bend == 0.0 {
            return pure;
        }

        let pure = f64::from(pure);
        let bent = if bend > 0.0 {
            let above = f64::from(self.codes[index + EDGE_PADDING]);
            pure + (above - pure) * bend
        } else {
            let below = f64::from(self.codes[index - EDGE_PADDING]);
            pure + (pure - below) * bend
        };

        bent.clamp(0.0, f64::from(MAX_PITCH_CODE)) as u16
    }
}
