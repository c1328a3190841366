//! The audio-thread half of the synthesizer.
//!
//! ```text
//! voice ─┬──────────────────────────────┬─> master gain ─> output
//!        └─> send ─> delay line ──┬─────┘
//!                       ^         │
//!                       └─feedback┘
//! ```

use crossbeam_channel::Receiver;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{DelayConfig, SynthConfig};
use crate::core::note::Note;
use crate::core::oscillator::{Envelope, Waveform};

/// One sounding note: tone oscillator, vibrato LFO and envelope.
///
/// Frames are absolute positions on the graph clock. A voice is built with
/// only its length; the graph places it at the first frame of the buffer
/// that picks it up. It is silent outside `start_frame..stop_frame` and is
/// dropped once the clock passes `stop_frame`.
#[derive(Debug, Clone)]
pub struct Voice {
    pub note: Note,
    pub frequency: f32,
    waveform: Waveform,
    envelope: Envelope,
    vibrato_rate: f32,
    vibrato_depth: f32,
    to_delay: bool,
    length_frames: u64,
    start_frame: u64,
    stop_frame: u64,
    phase: f32,
    vibrato_phase: f32,
}

impl Voice {
    pub fn new(note: Note, frequency: f32, config: &SynthConfig, sample_rate: f32) -> Self {
        let length_frames = (config.note.length.max(0.0) * sample_rate).round() as u64;
        Self {
            note,
            frequency,
            waveform: config.waveform,
            envelope: Envelope::new(&config.note),
            vibrato_rate: config.vibrato.rate,
            vibrato_depth: config.vibrato.depth,
            to_delay: config.route_to_delay,
            length_frames,
            start_frame: 0,
            stop_frame: length_frames,
            phase: 0.0,
            vibrato_phase: 0.0,
        }
    }

    /// Places the voice on the clock.
    pub fn start_at(&mut self, frame: u64) {
        self.start_frame = frame;
        self.stop_frame = frame + self.length_frames;
    }

    pub fn length_frames(&self) -> u64 {
        self.length_frames
    }

    #[cfg(test)]
    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    #[cfg(test)]
    pub fn stop_frame(&self) -> u64 {
        self.stop_frame
    }

    pub fn is_finished(&self, frame: u64) -> bool {
        frame >= self.stop_frame
    }

    /// Tone frequency for the next frame, bent by the vibrato LFO.
    fn current_frequency(&self) -> f32 {
        let vibrato = (TAU * self.vibrato_phase).sin() * self.vibrato_depth;
        (self.frequency + vibrato).max(0.0)
    }

    fn next_sample(&mut self, frame: u64, sample_rate: f32) -> f32 {
        if frame < self.start_frame || frame >= self.stop_frame {
            return 0.0;
        }
        let time = (frame - self.start_frame) as f32 / sample_rate;

        let frequency = self.current_frequency();
        self.vibrato_phase = (self.vibrato_phase + self.vibrato_rate / sample_rate).fract();

        let value = self.waveform.sample(self.phase);
        self.phase = (self.phase + frequency / sample_rate).fract();

        value * self.envelope.value_at(time)
    }
}

/// Delay line whose output is fed back into its own input.
#[derive(Debug)]
pub struct FeedbackDelay {
    line: Vec<f32>,
    cursor: usize,
    feedback: f32,
    send: f32,
}

impl FeedbackDelay {
    pub fn new(config: &DelayConfig, sample_rate: f32) -> Self {
        // A zero delay still needs one frame to break the feedback loop.
        let length = ((config.time * sample_rate).round() as usize).max(1);
        Self {
            line: vec![0.0; length],
            cursor: 0,
            feedback: config.feedback,
            send: config.send,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.line.len()
    }

    /// Pushes one input frame and returns the delayed output.
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line[self.cursor];
        self.line[self.cursor] = input * self.send + delayed * self.feedback;
        self.cursor = (self.cursor + 1) % self.line.len();
        delayed
    }
}

/// The persistent graph, owned by the audio callback.
pub struct AudioGraph {
    sample_rate: f32,
    master_gain: f32,
    delay: FeedbackDelay,
    voices: Vec<Voice>,
    incoming: Receiver<Voice>,
    clock: Arc<AtomicU64>,
}

impl AudioGraph {
    pub fn new(
        config: &SynthConfig,
        sample_rate: f32,
        incoming: Receiver<Voice>,
        clock: Arc<AtomicU64>,
    ) -> Self {
        Self {
            sample_rate,
            master_gain: config.master_gain,
            delay: FeedbackDelay::new(&config.delay, sample_rate),
            voices: Vec::with_capacity(64),
            incoming,
            clock,
        }
    }

    #[cfg(test)]
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    #[cfg(test)]
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Renders `out.len()` mono frames and advances the clock.
    pub fn render(&mut self, out: &mut [f32]) {
        let mut frame = self.clock.load(Ordering::Acquire);
        for mut voice in self.incoming.try_iter() {
            voice.start_at(frame);
            self.voices.push(voice);
        }

        for sample in out.iter_mut() {
            let mut dry = 0.0;
            let mut send = 0.0;
            for voice in &mut self.voices {
                let value = voice.next_sample(frame, self.sample_rate);
                dry += value;
                if voice.to_delay {
                    send += value;
                }
            }

            let wet = self.delay.process(send);
            *sample = ((dry + wet) * self.master_gain).clamp(-1.0, 1.0);
            frame += 1;
        }

        self.voices.retain(|voice| !voice.is_finished(frame));
        self.clock.store(frame, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::note::PitchClass;
    use crossbeam_channel::unbounded;

    const RATE: f32 = 1000.0;

    fn graph(config: &SynthConfig) -> (crossbeam_channel::Sender<Voice>, AudioGraph) {
        let (tx, rx) = unbounded();
        let graph = AudioGraph::new(config, RATE, rx, Arc::new(AtomicU64::new(0)));
        (tx, graph)
    }

    fn a4() -> Note {
        Note::new(PitchClass::A, 4)
    }

    fn steady_config() -> SynthConfig {
        let mut config = SynthConfig::classic();
        config.master_gain = 1.0;
        config.vibrato.depth = 0.0;
        config.note = crate::core::synth::NoteShape {
            attack: 0.0,
            sustain: 0.5,
            release: 0.0,
            length: 0.1,
        };
        config
    }

    #[test]
    fn voice_lasts_exactly_its_length() {
        let config = steady_config();
        let mut voice = Voice::new(a4(), 440.0, &config, RATE);
        assert_eq!(voice.length_frames(), 100);

        voice.start_at(250);
        assert_eq!(voice.start_frame(), 250);
        assert_eq!(voice.stop_frame(), 350);
        assert!(!voice.is_finished(349));
        assert!(voice.is_finished(350));
    }

    #[test]
    fn voices_start_at_the_buffer_that_picks_them_up() {
        let config = steady_config();
        let (tx, mut graph) = graph(&config);
        let voice = Voice::new(a4(), 440.0, &config, RATE);

        graph.render(&mut [0.0; 30]);
        tx.send(voice).unwrap();
        let mut buffer = vec![0.0; 10];
        graph.render(&mut buffer);

        let voice = &graph.voices()[0];
        assert_eq!(voice.start_frame(), 30);
        assert_eq!(voice.stop_frame(), 130);
        // attack is zero, so the first frame of the buffer already sounds
        assert!((buffer[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn voices_retire_after_their_stop_frame() {
        let config = steady_config();
        let (tx, mut graph) = graph(&config);
        tx.send(Voice::new(a4(), 440.0, &config, RATE)).unwrap();

        let mut buffer = vec![0.0; 50];
        graph.render(&mut buffer);
        assert_eq!(graph.voice_count(), 1);
        assert!(buffer.iter().any(|s| s.abs() > 0.0));

        graph.render(&mut buffer);
        assert_eq!(graph.voice_count(), 0);

        graph.render(&mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn overlapping_voices_are_independent() {
        let config = steady_config();
        let (tx, mut graph) = graph(&config);
        let c4 = Note::new(PitchClass::C, 4);
        tx.send(Voice::new(a4(), a4().frequency(), &config, RATE)).unwrap();
        tx.send(Voice::new(c4, c4.frequency(), &config, RATE)).unwrap();

        let mut buffer = vec![0.0; 10];
        graph.render(&mut buffer);

        let voices = graph.voices();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].note, a4());
        assert_eq!(voices[1].note, c4);
        assert_ne!(voices[0].frequency, voices[1].frequency);
        // Square waves at phase 0 are both +1, so the first frame sums them.
        assert!((buffer[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn master_gain_scales_output() {
        let mut config = steady_config();
        config.master_gain = 0.25;
        let (tx, mut graph) = graph(&config);
        tx.send(Voice::new(a4(), 440.0, &config, RATE)).unwrap();

        let mut buffer = vec![0.0; 1];
        graph.render(&mut buffer);
        assert!((buffer[0] - 0.125).abs() < 1e-6);
    }

    #[test]
    fn delay_echoes_routed_voices_only() {
        let mut config = steady_config();
        config.note.length = 0.01;
        config.delay = DelayConfig {
            time: 0.05,
            feedback: 0.0,
            send: 1.0,
        };

        let (tx, mut dry_graph) = graph(&config);
        tx.send(Voice::new(a4(), 440.0, &config, RATE)).unwrap();
        let mut dry = vec![0.0; 100];
        dry_graph.render(&mut dry);
        assert!(dry[50..60].iter().all(|s| *s == 0.0));

        config.route_to_delay = true;
        let (tx, mut wet_graph) = graph(&config);
        tx.send(Voice::new(a4(), 440.0, &config, RATE)).unwrap();
        let mut wet = vec![0.0; 100];
        wet_graph.render(&mut wet);
        assert_eq!(&wet[..10], &dry[..10]);
        assert!(wet[50..60].iter().any(|s| s.abs() > 0.0));
    }

    fn vibrato_config(depth: f32) -> SynthConfig {
        let mut config = steady_config();
        config.waveform = Waveform::Sine;
        config.note.length = 1.0;
        config.vibrato = crate::core::synth::Vibrato { rate: 5.0, depth };
        config
    }

    #[test]
    fn vibrato_bends_the_tone() {
        let render = |depth: f32| {
            let config = vibrato_config(depth);
            let (tx, mut graph) = graph(&config);
            tx.send(Voice::new(a4(), 440.0, &config, RATE)).unwrap();
            let mut buffer = vec![0.0; 400];
            graph.render(&mut buffer);
            buffer
        };

        let plain = render(0.0);
        let bent = render(20.0);
        assert_eq!(plain[0], bent[0]);
        assert!(plain.iter().zip(&bent).any(|(a, b)| (a - b).abs() > 0.1));
    }

    #[test]
    fn vibrato_stays_within_its_depth() {
        let depth = 20.0;
        let config = vibrato_config(depth);
        let mut voice = Voice::new(a4(), 440.0, &config, RATE);

        let mut lowest = f32::MAX;
        let mut highest = f32::MIN;
        for frame in 0..400 {
            let frequency = voice.current_frequency();
            assert!((440.0 - depth - 1e-3..=440.0 + depth + 1e-3).contains(&frequency));
            lowest = lowest.min(frequency);
            highest = highest.max(frequency);
            voice.next_sample(frame, RATE);
        }
        // two full LFO cycles reach both extremes
        assert!(highest > 440.0 + depth * 0.99);
        assert!(lowest < 440.0 - depth * 0.99);
    }

    #[test]
    fn feedback_repeats_and_decays() {
        let mut delay = FeedbackDelay::new(
            &DelayConfig {
                time: 0.002,
                feedback: 0.5,
                send: 1.0,
            },
            RATE,
        );
        assert_eq!(delay.len(), 2);

        let outputs: Vec<f32> = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]
            .into_iter()
            .map(|input| delay.process(input))
            .collect();
        assert_eq!(outputs, vec![0.0, 0.0, 1.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn clock_advances_with_rendering() {
        let config = steady_config();
        let (tx, rx) = unbounded::<Voice>();
        let clock = Arc::new(AtomicU64::new(0));
        let mut graph = AudioGraph::new(&config, RATE, rx, Arc::clone(&clock));
        drop(tx);

        graph.render(&mut [0.0; 64]);
        graph.render(&mut [0.0; 36]);
        assert_eq!(clock.load(Ordering::Acquire), 100);
    }
}
