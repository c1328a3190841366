mod keymap;

pub use keymap::{key_char, ComputerKeyboard, KeyRepeat, ANCHOR_INDEX, KEY_ROW};

use crate::core::note::Note;

/// Whether a key went down or came back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Down,
    Up,
}

/// Where a note event originated. Consumers treat every source the same way;
/// this is kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Pointer,
    ComputerKeyboard,
    Hardware,
    Random,
}

/// The normalized event every input produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub note: Note,
    pub phase: Phase,
    pub source: Source,
}

impl NoteEvent {
    pub fn new(note: Note, phase: Phase, source: Source) -> Self {
        Self { note, phase, source }
    }

    pub fn down(note: Note, source: Source) -> Self {
        Self::new(note, Phase::Down, source)
    }

    pub fn up(note: Note, source: Source) -> Self {
        Self::new(note, Phase::Up, source)
    }

    pub fn is_down(&self) -> bool {
        self.phase == Phase::Down
    }
}
