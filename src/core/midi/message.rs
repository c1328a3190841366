use crate::core::input::{NoteEvent, Phase, Source};
use crate::core::note::Note;

/// Channel-voice command for a key press.
pub const NOTE_ON: u8 = 9;
/// Channel-voice command for a key release.
pub const NOTE_OFF: u8 = 8;

/// A decoded 3-byte channel-voice message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiMessage {
    pub command: u8,
    pub channel: u8,
    pub note: u8,
    /// Velocity scaled to 0.0..=1.0.
    pub velocity: f32,
}

impl MidiMessage {
    /// Decodes a raw message. Anything that is not exactly three bytes long
    /// (system exclusive, realtime, program change) yields `None`.
    pub fn decode(data: &[u8]) -> Option<Self> {
        match *data {
            [status, note, velocity] => Some(Self {
                command: status >> 4,
                channel: status & 0x0f,
                note,
                velocity: velocity as f32 / 127.0,
            }),
            _ => None,
        }
    }

    /// Key addressed by this message, if it lies on the board.
    pub fn key(&self) -> Option<Note> {
        Note::from_midi(self.note)
    }

    /// Normalizes the message. Commands other than note-on/note-off and notes
    /// off the board produce no event.
    ///
    /// A note-on with zero velocity releases the key, as most controllers send
    /// note-offs that way. Treating every note-on as a press would leave such
    /// keys lit; this is a deliberate departure from the plain command 9 ->
    /// press mapping.
    pub fn to_event(&self) -> Option<NoteEvent> {
        let phase = match self.command {
            NOTE_ON if self.velocity > 0.0 => Phase::Down,
            NOTE_ON | NOTE_OFF => Phase::Up,
            _ => return None,
        };
        Some(NoteEvent::new(self.key()?, phase, Source::Hardware))
    }
}
