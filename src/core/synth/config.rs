use serde::{Deserialize, Serialize};

use crate::core::oscillator::Waveform;

/// Longest delay line the graph allocates, in seconds.
pub const MAX_DELAY_TIME: f32 = 1.0;

/// Highest feedback gain; anything at or above 1.0 would never decay.
pub const MAX_FEEDBACK: f32 = 0.95;

/// Shape of every note, as fractions of its fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteShape {
    /// Share of `length` spent ramping up.
    pub attack: f32,
    /// Held amplitude.
    pub sustain: f32,
    /// Share of `length` spent ramping down.
    pub release: f32,
    /// Seconds from start to stop.
    pub length: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vibrato {
    /// LFO rate in Hz.
    pub rate: f32,
    /// Peak frequency deviation in Hz.
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayConfig {
    pub time: f32,
    pub feedback: f32,
    /// Gain in front of the delay line.
    pub send: f32,
}

/// Everything that shapes the sound of one deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthConfig {
    pub waveform: Waveform,
    pub master_gain: f32,
    pub note: NoteShape,
    pub vibrato: Vibrato,
    pub delay: DelayConfig,
    /// Whether voices also feed the delay send.
    pub route_to_delay: bool,
}

impl SynthConfig {
    /// Short square-wave blips, delay wired but not fed.
    pub fn classic() -> Self {
        Self {
            waveform: Waveform::Square,
            master_gain: 0.5,
            note: NoteShape {
                attack: 0.3,
                sustain: 0.8,
                release: 0.3,
                length: 0.2,
            },
            vibrato: Vibrato {
                rate: 10.0,
                depth: 1.0,
            },
            delay: DelayConfig {
                time: 0.65,
                feedback: 0.05,
                send: 0.0,
            },
            route_to_delay: false,
        }
    }

    /// Longer sawtooth notes through the feedback delay.
    pub fn echo() -> Self {
        Self {
            waveform: Waveform::Sawtooth,
            master_gain: 0.4,
            note: NoteShape {
                attack: 0.1,
                sustain: 0.6,
                release: 0.5,
                length: 0.6,
            },
            vibrato: Vibrato {
                rate: 5.0,
                depth: 2.0,
            },
            delay: DelayConfig {
                time: 0.3,
                feedback: 0.35,
                send: 0.5,
            },
            route_to_delay: true,
        }
    }

    /// Built-in presets by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "echo" => Some(Self::echo()),
            _ => None,
        }
    }

    pub const BUILTIN_NAMES: [&'static str; 2] = ["classic", "echo"];

    /// Copy with every field pulled into the range the graph can render.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        config.master_gain = config.master_gain.clamp(0.0, 1.0);
        config.note.attack = config.note.attack.clamp(0.0, 1.0);
        config.note.release = config.note.release.clamp(0.0, 1.0);
        config.note.sustain = config.note.sustain.clamp(0.0, 1.0);
        config.note.length = config.note.length.max(0.0);
        config.vibrato.rate = config.vibrato.rate.max(0.0);
        config.vibrato.depth = config.vibrato.depth.max(0.0);
        config.delay.time = config.delay.time.clamp(0.0, MAX_DELAY_TIME);
        config.delay.feedback = config.delay.feedback.clamp(0.0, MAX_FEEDBACK);
        config.delay.send = config.delay.send.clamp(0.0, 1.0);
        config
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self::classic()
    }
}
