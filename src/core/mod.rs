pub mod input;
pub mod midi;
pub mod note;
pub mod oscillator;
pub mod synth;
