mod bus;
mod types;

pub use bus::{MessageBus, NoteListener};
pub use types::{MessageKind, PianoMessage};
