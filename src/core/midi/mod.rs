mod input;
mod message;

pub use input::{
    establish, ConnectOutcome, ConnectionState, DeviceInfo, InputDevice, MidiAccess, MidiConnector,
    MidirAccess, Permission,
};
pub use message::{MidiMessage, NOTE_OFF, NOTE_ON};
