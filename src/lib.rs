//! # Presto
//!
//! A score playback engine: a tempo-controlled scheduler advances a cursor
//! through the notated notes of a score while a synthesizer beeps the
//! pitches under it.
//!
//! The platform-independent scheduling logic lives in [`presto_core`];
//! this crate adds the audio-device half: a cpal-backed chord synthesizer
//! and a wall-clock step timer, plus a demo binary wiring everything
//! together.
//!
//! ## Modules
//!
//! - `synth`: the cue-tone synthesizer (oscillators, beep envelope, cpal
//!   output stream).
//! - `timer`: the real-time step timer delivering fires over a channel.

pub mod synth;
pub mod timer;

pub use presto_core;

// Re-export the pieces a host wires together
pub use presto_core::{PlaybackScheduler, PlaybackState, TempoController};
pub use synth::AudioSynthesizer;
pub use timer::{StepFired, ThreadTimer};
