use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream};
use crossbeam_channel::{unbounded, Sender};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::graph::{AudioGraph, Voice};
use super::SynthConfig;
use crate::core::input::NoteEvent;
use crate::core::note::Note;
use crate::error::PianoError;
use crate::messaging::NoteListener;

/// Control-thread half of the synthesizer.
///
/// Builds voices and hands them to the audio thread, which starts each one
/// at the next buffer it renders. It never waits on the audio thread.
pub struct VoiceScheduler {
    config: SynthConfig,
    sample_rate: f32,
    clock: Arc<AtomicU64>,
    voices: Sender<Voice>,
}

impl VoiceScheduler {
    /// Creates a scheduler together with the graph it feeds.
    pub fn new(config: &SynthConfig, sample_rate: f32) -> (Self, AudioGraph) {
        let config = config.sanitized();
        let (voices, incoming) = unbounded();
        let clock = Arc::new(AtomicU64::new(0));
        let graph = AudioGraph::new(&config, sample_rate, incoming, Arc::clone(&clock));

        let scheduler = Self {
            config,
            sample_rate,
            clock,
            voices,
        };
        (scheduler, graph)
    }

    /// Current position of the audio clock, in seconds.
    pub fn now(&self) -> f64 {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    /// Starts a voice for `note` now; it stops by itself after the note
    /// length. Releasing the key has no effect on it.
    pub fn play_note(&self, note: Note) -> Result<(), PianoError> {
        let frequency = note.frequency();
        let voice = Voice::new(note, frequency, &self.config, self.sample_rate);

        debug!(
            "play {} at {:.2} Hz for {} frames, clock at {:.3} s",
            note,
            frequency,
            voice.length_frames(),
            self.now()
        );
        self.voices
            .send(voice)
            .map_err(|_| PianoError::Audio("audio graph has shut down".to_string()))
    }
}

/// A running synthesizer: the scheduler plus the output stream that owns
/// the graph.
pub struct SynthEngine {
    scheduler: VoiceScheduler,
    _stream: Stream,
}

impl SynthEngine {
    /// Opens the default output device and starts rendering.
    pub fn new(config: &SynthConfig) -> Result<Self, PianoError> {
        let host = cpal::default_host();
        info!("Using audio host: {}", host.id().name());

        let device = host
            .default_output_device()
            .ok_or_else(|| PianoError::Audio("no output device available".to_string()))?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        info!("Using output device: {}", device_name);

        let supported = device
            .default_output_config()
            .map_err(|e| PianoError::Audio(e.to_string()))?;
        let sample_format = supported.sample_format();
        let stream_config = cpal::StreamConfig::from(supported);
        let sample_rate = stream_config.sample_rate.0 as f32;
        debug!("Device config: {:?}, {}", stream_config, sample_format);

        let (scheduler, graph) = VoiceScheduler::new(config, sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => create_stream::<f32>(&device, &stream_config, graph),
            SampleFormat::I16 => create_stream::<i16>(&device, &stream_config, graph),
            SampleFormat::U16 => create_stream::<u16>(&device, &stream_config, graph),
            other => Err(PianoError::Audio(format!("unsupported sample format {}", other))),
        }?;
        stream.play().map_err(|e| PianoError::Audio(e.to_string()))?;
        info!("Audio stream started at {} Hz", sample_rate);

        Ok(Self {
            scheduler,
            _stream: stream,
        })
    }

    pub fn play_note(&self, note: Note) -> Result<(), PianoError> {
        self.scheduler.play_note(note)
    }
}

fn create_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut graph: AudioGraph,
) -> Result<Stream, PianoError>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let channels = config.channels as usize;
    let mut mono = Vec::new();
    let err_fn = |err| error!("an error occurred on the audio stream: {}", err);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                mono.resize(data.len() / channels, 0.0);
                graph.render(&mut mono);

                for (frame, value) in data.chunks_mut(channels).zip(&mono) {
                    let value_t = T::from_sample(*value);
                    for sample in frame.iter_mut() {
                        *sample = value_t;
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| PianoError::Audio(e.to_string()))
}

/// The sound side of a session.
///
/// When the output could not be opened, note-downs are ignored: the first
/// one logs a warning, the rest are dropped silently.
pub enum AudioOutput {
    Running(SynthEngine),
    Unavailable { reason: String, warned: bool },
}

impl AudioOutput {
    pub fn open(config: &SynthConfig) -> Self {
        match SynthEngine::new(config) {
            Ok(engine) => AudioOutput::Running(engine),
            Err(err) => {
                error!("{}", err);
                AudioOutput::Unavailable {
                    reason: err.to_string(),
                    warned: false,
                }
            }
        }
    }

    pub fn status(&self) -> String {
        match self {
            AudioOutput::Running(_) => "Audio: running".to_string(),
            AudioOutput::Unavailable { reason, .. } => format!("Audio: {}", reason),
        }
    }
}

impl NoteListener for VoiceScheduler {
    fn on_note(&mut self, event: &NoteEvent) {
        if event.is_down() {
            if let Err(err) = self.play_note(event.note) {
                warn!("{}", err);
            }
        }
    }
}

impl NoteListener for AudioOutput {
    fn on_note(&mut self, event: &NoteEvent) {
        match self {
            AudioOutput::Running(engine) => engine.scheduler.on_note(event),
            AudioOutput::Unavailable { reason, warned } => {
                if event.is_down() && !*warned {
                    warn!("ignoring notes, {}", reason);
                    *warned = true;
                }
            }
        }
    }
}
