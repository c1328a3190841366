use crate::core::input::NoteEvent;
use crate::core::midi::{ConnectOutcome, MidiMessage};

/// Messages flowing from producers (UI, MIDI callback thread, connection
/// thread) to the control thread.
#[derive(Debug, Clone, PartialEq)]
pub enum PianoMessage {
    Note(NoteEvent),
    Midi(MidiMessage),
    Connection(ConnectOutcome),
    Log(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Note,
    Midi,
    Connection,
    Log,
}

impl PianoMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            PianoMessage::Note(_) => MessageKind::Note,
            PianoMessage::Midi(_) => MessageKind::Midi,
            PianoMessage::Connection(_) => MessageKind::Connection,
            PianoMessage::Log(_) => MessageKind::Log,
        }
    }
}
