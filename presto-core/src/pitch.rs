//! Equal-tempered pitch-to-frequency conversion
//!
//! Pitches are integer semitone offsets measured against a fixed reference
//! pitch. The reference frequency is 880 Hz — an octave above concert
//! pitch, chosen for a brighter cue timbre.

/// Semitone offset of the reference pitch.
pub const REFERENCE_PITCH: i32 = 69;

/// Frequency of the reference pitch in Hz.
pub const REFERENCE_FREQUENCY: f32 = 880.0;

/// Convert a semitone offset to a frequency in Hz.
///
/// Uses the equal-tempered formula `f = f_ref * 2^((h - h_ref) / 12)`.
pub fn pitch_to_frequency(half_tone: i32) -> f32 {
    REFERENCE_FREQUENCY * 2.0_f32.powf((half_tone - REFERENCE_PITCH) as f32 / 12.0)
}
