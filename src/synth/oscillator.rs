//! Sine tone generator
//!
//! One oscillator per sounding pitch; phase-accumulator based so frequency
//! stays exact at any sample rate.

use std::f32::consts::PI;

/// Per-tone sine oscillator state.
pub struct SineOscillator {
    frequency: f32,
    phase: f32,
    sample_rate: f32,
}

impl SineOscillator {
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        Self {
            frequency,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Generate the next raw sample in [-1, 1].
    pub fn next_sample(&mut self) -> f32 {
        let value = (2.0 * PI * self.phase).sin();
        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }
}
