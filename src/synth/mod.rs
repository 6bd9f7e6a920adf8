//! Chord cue synthesizer
//!
//! [`AudioSynthesizer`] implements the scheduler's [`ChordSink`]: each
//! chord becomes one [`ChordVoice`] — an independent sine oscillator per
//! frequency sharing a single beep envelope — mixed into a cpal output
//! stream. The stream is opened lazily on the first chord of the session
//! and reused for every subsequent one; when no output device is available
//! the synthesizer logs a warning once and chords are silently skipped.

pub mod envelope;
pub mod oscillator;

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use envelope::BeepEnvelope;
use oscillator::SineOscillator;
use presto_core::ChordSink;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// One sounding chord: a tone generator per frequency behind one shared
/// amplitude envelope. Self-terminates when the envelope finishes.
pub struct ChordVoice {
    oscillators: Vec<SineOscillator>,
    envelope: BeepEnvelope,
}

impl ChordVoice {
    pub fn new(frequencies: &[f32], intensity: f32, sample_rate: f32) -> Self {
        Self {
            oscillators: frequencies
                .iter()
                .map(|&frequency| SineOscillator::new(frequency, sample_rate))
                .collect(),
            envelope: BeepEnvelope::new(intensity, sample_rate),
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let amplitude = self.envelope.next_sample();
        if amplitude == 0.0 {
            return 0.0;
        }
        let summed: f32 = self
            .oscillators
            .iter_mut()
            .map(|oscillator| oscillator.next_sample())
            .sum();
        summed * amplitude
    }

    pub fn is_finished(&self) -> bool {
        self.envelope.is_finished()
    }
}

/// Cue-tone synthesizer backed by a lazily opened cpal stream.
pub struct AudioSynthesizer {
    backend: Option<AudioBackend>,
    unavailable: bool,
}

impl AudioSynthesizer {
    /// Create a synthesizer. No audio resources are touched until the
    /// first chord is sounded.
    pub fn new() -> Self {
        Self {
            backend: None,
            unavailable: false,
        }
    }

    /// Whether a backend has been opened for this session.
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&mut self) -> Option<&AudioBackend> {
        if self.backend.is_none() && !self.unavailable {
            match AudioBackend::open() {
                Ok(backend) => {
                    debug!(sample_rate = backend.sample_rate, "audio backend opened");
                    self.backend = Some(backend);
                }
                Err(error) => {
                    warn!(%error, "audio backend unavailable; chords will be skipped");
                    self.unavailable = true;
                }
            }
        }
        self.backend.as_ref()
    }
}

impl Default for AudioSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChordSink for AudioSynthesizer {
    fn sound_chord(&mut self, frequencies: &[f32], intensity: f32) {
        if frequencies.is_empty() {
            return;
        }
        let Some(backend) = self.backend() else {
            return;
        };
        backend.push_chord(frequencies, intensity);
    }
}

/// The shared output stream and the voices currently sounding through it.
struct AudioBackend {
    _stream: Stream,
    voices: Arc<Mutex<Vec<ChordVoice>>>,
    sample_rate: f32,
}

impl AudioBackend {
    fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no output device available"))?;
        let config = device.default_output_config()?;

        let sample_format = config.sample_format();
        let config: StreamConfig = config.into();
        let sample_rate = config.sample_rate.0 as f32;

        let voices: Arc<Mutex<Vec<ChordVoice>>> = Arc::new(Mutex::new(Vec::new()));
        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, voices.clone())?,
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, voices.clone())?,
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, voices.clone())?,
            _ => return Err(anyhow!("unsupported sample format: {:?}", sample_format)),
        };
        stream.play()?;

        Ok(AudioBackend {
            _stream: stream,
            voices,
            sample_rate,
        })
    }

    fn push_chord(&self, frequencies: &[f32], intensity: f32) {
        let mut voices = self.voices.lock().unwrap();
        voices.push(ChordVoice::new(frequencies, intensity, self.sample_rate));
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        voices: Arc<Mutex<Vec<ChordVoice>>>,
    ) -> Result<Stream>
    where
        T: Sample + SizedSample + Send + 'static + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let err_fn = |err| warn!(error = %err, "output audio stream error");

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut voices = voices.lock().unwrap();
                    for frame in data.chunks_mut(channels) {
                        let mixed: f32 = voices
                            .iter_mut()
                            .map(|voice| voice.next_sample())
                            .sum();
                        let value: T = cpal::Sample::from_sample(mixed);
                        for sample in frame.iter_mut() {
                            *sample = value;
                        }
                    }
                    voices.retain(|voice| !voice.is_finished());
                },
                err_fn,
                None,
            )
            .map_err(|e| anyhow!("failed to build output stream: {}", e))?;

        Ok(stream)
    }
}
