use thiserror::Error;

/// Failures local to a single event. None of them poison the audio graph or
/// the keyboard state for later events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PianoError {
    /// A note name whose pitch class or octave could not be read.
    #[error("invalid note: {0}")]
    InvalidNote(String),

    /// A key lookup by name that has no key on the 88-key board.
    #[error("missing key: {0}")]
    MissingKey(String),

    #[error("MIDI access denied")]
    PermissionDenied,

    #[error("MIDI connection failed: {0}")]
    Connection(String),

    #[error("audio output unavailable: {0}")]
    Audio(String),
}
