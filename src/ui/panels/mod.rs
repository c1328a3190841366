pub mod activity;
pub mod midi;
pub mod synth;

pub use activity::ActivityLog;
pub use synth::{SynthAction, SynthPanel};
