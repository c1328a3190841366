use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PianoError;

/// Number of keys on the board, A0 through C8.
pub const KEY_COUNT: usize = 88;

/// MIDI note number of A0, the first key.
pub const MIDI_OFFSET: u8 = 21;

/// Reference pitch of A4.
pub const A4_FREQUENCY: f32 = 440.0;

/// Semitones from C up to A; the table starts on A0.
const TABLE_START: usize = 9;

/// The twelve pitch classes, spelled with flats only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Db,
        PitchClass::D,
        PitchClass::Eb,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Gb,
        PitchClass::G,
        PitchClass::Ab,
        PitchClass::A,
        PitchClass::Bb,
        PitchClass::B,
    ];

    /// Position within the octave, C = 0.
    pub fn semitone(self) -> usize {
        self as usize
    }

    /// Signed distance from A within the same octave.
    pub fn offset_from_a(self) -> i32 {
        self.semitone() as i32 - 9
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Db => "Db",
            PitchClass::D => "D",
            PitchClass::Eb => "Eb",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Gb => "Gb",
            PitchClass::G => "G",
            PitchClass::Ab => "Ab",
            PitchClass::A => "A",
            PitchClass::Bb => "Bb",
            PitchClass::B => "B",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pitch| pitch.name() == name)
    }

    pub fn is_flat(self) -> bool {
        self.name().len() == 2
    }
}

/// A pitch class in a given octave.
///
/// Any octave can be represented, but only A0..=C8 has a key and a table
/// index. Everything that maps notes to keys or to MIDI numbers goes through
/// [`Note::from_index`] / [`Note::index`], so the frequency lookup and the key
/// lookup always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch: PitchClass,
    pub octave: i8,
}

impl Note {
    pub const fn new(pitch: PitchClass, octave: i8) -> Self {
        Self { pitch, octave }
    }

    /// Looks up a key of the 88-entry table, index 0 being A0.
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= KEY_COUNT {
            return None;
        }
        let absolute = index + TABLE_START;
        Some(Self {
            pitch: PitchClass::ALL[absolute % 12],
            octave: (absolute / 12) as i8,
        })
    }

    /// Table index of this note, or `None` if it has no key.
    pub fn index(&self) -> Option<usize> {
        let absolute =
            self.octave as i32 * 12 + self.pitch.semitone() as i32 - TABLE_START as i32;
        (0..KEY_COUNT as i32)
            .contains(&absolute)
            .then_some(absolute as usize)
    }

    /// Maps a hardware note number onto the table. Numbers outside
    /// 21..=108 have no key and yield `None`.
    pub fn from_midi(number: u8) -> Option<Self> {
        (number as usize)
            .checked_sub(MIDI_OFFSET as usize)
            .and_then(Self::from_index)
    }

    #[cfg(test)]
    pub fn midi_number(&self) -> Option<u8> {
        self.index().map(|index| index as u8 + MIDI_OFFSET)
    }

    /// Equal-tempered frequency with A4 = 440 Hz.
    pub fn frequency(&self) -> f32 {
        let semitones = self.pitch.offset_from_a() + (self.octave as i32 - 4) * 12;
        A4_FREQUENCY * 2.0f32.powf(semitones as f32 / 12.0)
    }

    pub fn is_black(&self) -> bool {
        self.pitch.is_flat()
    }

    /// All 88 keys in table order.
    pub fn all() -> impl Iterator<Item = Note> {
        (0..KEY_COUNT).filter_map(Note::from_index)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The third key of the board is labelled plain "B" in the keyboard asset.
        if self.pitch == PitchClass::B && self.octave == 0 {
            return f.write_str("B");
        }
        write!(f, "{}{}", self.pitch.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = PianoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "B" {
            return Ok(Note::new(PitchClass::B, 0));
        }
        let invalid = || PianoError::InvalidNote(s.to_string());
        let split = s
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(invalid)?;
        let (pitch, octave) = s.split_at(split);
        let pitch = PitchClass::from_name(pitch).ok_or_else(invalid)?;
        let octave = octave.parse::<i8>().map_err(|_| invalid())?;
        Ok(Note::new(pitch, octave))
    }
}

/// Frequency of a note given by name, e.g. `"A4"`, `"Bb0"` or the bare `"B"`.
///
/// Only natural and flat spellings are understood; a name of length three
/// with a `b` in the middle is one semitone below its letter.
pub fn frequency(name: &str) -> Result<f32, PianoError> {
    let invalid = || PianoError::InvalidNote(name.to_string());

    let letter = name.chars().next().ok_or_else(invalid)?;
    let offset = match letter {
        'C' => -9,
        'D' => -7,
        'E' => -5,
        'F' => -4,
        'G' => -2,
        'A' => 0,
        'B' => 2,
        _ => return Err(invalid()),
    };

    let flat = usize::from(name.len() == 3 && name.as_bytes()[1] == b'b');
    let octave = match &name[1 + flat..] {
        "" => 0,
        digits => digits.parse::<i32>().map_err(|_| invalid())?,
    };

    let semitones = offset - flat as i32 + (octave - 4) * 12;
    Ok(A4_FREQUENCY * 2.0f32.powf(semitones as f32 / 12.0))
}
