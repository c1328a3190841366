use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{NoteEvent, Source};
use crate::core::note::Note;

/// Physical keys in chromatic order, starting on the anchor note.
pub const KEY_ROW: &str = "awsedftgyhujkolp;'";

/// Table index of C4, the note under the first key of [`KEY_ROW`].
pub const ANCHOR_INDEX: usize = 3 + 12 * 3;

/// What to do with auto-repeated key-down events from the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyRepeat {
    /// Every repeat becomes another Down event and retriggers the note.
    #[default]
    PassThrough,
    /// Only the first Down of a held key is reported.
    Suppress,
}

/// Maps computer-keyboard keys onto notes.
#[derive(Debug, Default)]
pub struct ComputerKeyboard {
    policy: KeyRepeat,
    held: HashSet<char>,
}

impl ComputerKeyboard {
    pub fn new(policy: KeyRepeat) -> Self {
        Self {
            policy,
            held: HashSet::new(),
        }
    }

    pub fn set_policy(&mut self, policy: KeyRepeat) {
        self.policy = policy;
        self.held.clear();
    }

    /// Note played by a key, if the key is part of the row.
    pub fn note_for_key(key: char) -> Option<Note> {
        let key = key.to_ascii_lowercase();
        let position = KEY_ROW.chars().position(|c| c == key)?;
        Note::from_index(ANCHOR_INDEX + position)
    }

    pub fn key_down(&mut self, key: char) -> Option<NoteEvent> {
        let note = Self::note_for_key(key)?;
        let first_press = self.held.insert(key.to_ascii_lowercase());
        if !first_press && self.policy == KeyRepeat::Suppress {
            return None;
        }
        Some(NoteEvent::down(note, Source::ComputerKeyboard))
    }

    pub fn key_up(&mut self, key: char) -> Option<NoteEvent> {
        let note = Self::note_for_key(key)?;
        self.held.remove(&key.to_ascii_lowercase());
        Some(NoteEvent::up(note, Source::ComputerKeyboard))
    }
}

/// Single character typed by a key, taken from its display name
/// ("A" -> 'a', ";" -> ';'). Named keys such as "Space" yield `None`.
pub fn key_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    let c = chars.next()?;
    chars.next().is_none().then(|| c.to_ascii_lowercase())
}
