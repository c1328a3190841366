mod envelope;
mod waveform;

pub use self::envelope::{Envelope, EnvelopeStage};
pub use self::waveform::Waveform;
