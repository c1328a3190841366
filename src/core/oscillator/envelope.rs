use crate::core::synth::NoteShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Sustain,
    Release,
    Idle,
}

/// Amplitude curve of one voice, in seconds from the voice's start.
///
/// Linear from 0 to `sustain` until `attack_end`, flat until
/// `release_start`, linear back to 0 at `end`. Segment boundaries are
/// clamped so that `0 <= attack_end <= release_start <= end`; when attack and
/// release fractions add up to more than one, the attack keeps its length and
/// the release gets what is left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub sustain: f32,
    pub attack_end: f32,
    pub release_start: f32,
    pub end: f32,
}

impl Envelope {
    pub fn new(shape: &NoteShape) -> Self {
        let end = shape.length.max(0.0);
        let attack_end = shape.attack.clamp(0.0, 1.0) * end;
        let release_start = (end * (1.0 - shape.release.clamp(0.0, 1.0))).max(attack_end);

        Self {
            sustain: shape.sustain.max(0.0),
            attack_end,
            release_start,
            end,
        }
    }

    pub fn stage_at(&self, time: f32) -> EnvelopeStage {
        if time < 0.0 || time >= self.end {
            EnvelopeStage::Idle
        } else if time < self.attack_end {
            EnvelopeStage::Attack
        } else if time < self.release_start {
            EnvelopeStage::Sustain
        } else {
            EnvelopeStage::Release
        }
    }

    pub fn value_at(&self, time: f32) -> f32 {
        match self.stage_at(time) {
            EnvelopeStage::Attack => self.sustain * time / self.attack_end,
            EnvelopeStage::Sustain => self.sustain,
            EnvelopeStage::Release => {
                self.sustain * (self.end - time) / (self.end - self.release_start)
            },
            EnvelopeStage::Idle => 0.0,
        }
    }
}
