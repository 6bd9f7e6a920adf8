//! Beep amplitude envelope
//!
//! Every cue chord shares a single fixed-shape envelope: an exponential
//! rise from near silence to `0.2 * intensity` over 10 ms, then an
//! exponential decay back to near silence by 200 ms total. The envelope
//! self-terminates; a finished voice is dropped by the mixer.

/// Level treated as silence at both ends of the ramp. Exponential ramps
/// cannot start or end at exactly zero.
pub const NEAR_SILENCE: f32 = 0.0001;

/// Peak amplitude as a fraction of intensity.
pub const PEAK_SCALE: f32 = 0.2;

/// Rise time in seconds.
pub const ATTACK_SECS: f32 = 0.01;

/// Total envelope duration in seconds.
pub const TOTAL_SECS: f32 = 0.2;

/// Sample-accurate two-stage exponential envelope for one chord.
pub struct BeepEnvelope {
    level: f32,
    attack_ratio: f32,
    decay_ratio: f32,
    attack_remaining: u32,
    total_remaining: u32,
}

impl BeepEnvelope {
    /// Create an envelope peaking at `0.2 * intensity`.
    pub fn new(intensity: f32, sample_rate: f32) -> Self {
        let peak = (PEAK_SCALE * intensity).max(NEAR_SILENCE);
        let attack_samples = (ATTACK_SECS * sample_rate).max(1.0);
        let decay_samples = ((TOTAL_SECS - ATTACK_SECS) * sample_rate).max(1.0);

        // Geometric per-sample ratios: level * ratio^n walks an exponential
        // ramp from NEAR_SILENCE to peak (and back) in n samples.
        Self {
            level: NEAR_SILENCE,
            attack_ratio: (peak / NEAR_SILENCE).powf(1.0 / attack_samples),
            decay_ratio: (NEAR_SILENCE / peak).powf(1.0 / decay_samples),
            attack_remaining: attack_samples as u32,
            total_remaining: (TOTAL_SECS * sample_rate).max(1.0) as u32,
        }
    }

    /// Generate the next amplitude value. Returns 0.0 once finished.
    pub fn next_sample(&mut self) -> f32 {
        if self.total_remaining == 0 {
            return 0.0;
        }
        self.total_remaining -= 1;

        if self.attack_remaining > 0 {
            self.attack_remaining -= 1;
            self.level *= self.attack_ratio;
        } else {
            self.level *= self.decay_ratio;
        }
        self.level
    }

    /// True once the full duration has elapsed.
    pub fn is_finished(&self) -> bool {
        self.total_remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    #[test]
    fn test_envelope_rises_during_attack() {
        let mut env = BeepEnvelope::new(0.9, SAMPLE_RATE);
        let first = env.next_sample();
        for _ in 0..100 {
            env.next_sample();
        }
        assert!(env.next_sample() > first, "level should rise during attack");
    }

    #[test]
    fn test_envelope_peaks_near_scaled_intensity() {
        let intensity = 0.9;
        let mut env = BeepEnvelope::new(intensity, SAMPLE_RATE);

        let mut peak: f32 = 0.0;
        while !env.is_finished() {
            peak = peak.max(env.next_sample());
        }
        let expected = PEAK_SCALE * intensity;
        assert!(
            (peak - expected).abs() < 0.01,
            "peak {} not near {}",
            peak,
            expected
        );
    }

    #[test]
    fn test_envelope_decays_to_near_silence() {
        let mut env = BeepEnvelope::new(0.9, SAMPLE_RATE);
        let mut last = 0.0;
        while !env.is_finished() {
            last = env.next_sample();
        }
        assert!(last < 0.001, "final level {} should be near silence", last);
    }

    #[test]
    fn test_envelope_finishes_after_total_duration() {
        let mut env = BeepEnvelope::new(0.9, SAMPLE_RATE);
        let total_samples = (TOTAL_SECS * SAMPLE_RATE) as usize;

        for _ in 0..total_samples {
            env.next_sample();
        }
        assert!(env.is_finished());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn test_output_range() {
        let mut env = BeepEnvelope::new(1.0, SAMPLE_RATE);
        while !env.is_finished() {
            let sample = env.next_sample();
            assert!(
                (0.0..=PEAK_SCALE + 0.001).contains(&sample),
                "sample {} out of range",
                sample
            );
        }
    }

    #[test]
    fn test_zero_intensity_stays_quiet() {
        let mut env = BeepEnvelope::new(0.0, SAMPLE_RATE);
        while !env.is_finished() {
            assert!(env.next_sample() <= NEAR_SILENCE * 1.01);
        }
    }
}
