mod config;
mod engine;
mod graph;
pub mod preset;

pub use config::{DelayConfig, NoteShape, SynthConfig, Vibrato, MAX_DELAY_TIME, MAX_FEEDBACK};
pub use engine::{AudioOutput, SynthEngine, VoiceScheduler};
pub use graph::{AudioGraph, FeedbackDelay, Voice};
pub use preset::SynthPreset;
