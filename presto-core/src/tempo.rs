//! Tempo ownership and validation
//!
//! [`TempoController`] holds the current playback tempo in beats per
//! minute, keeps it inside the valid range, and derives the initial tempo
//! from score metadata on load. Display observers (a BPM slider, a numeric
//! box) register callbacks and are notified on every change attempt.

use tracing::debug;

/// Lowest accepted tempo in BPM.
pub const MIN_TEMPO: u32 = 30;

/// Highest accepted tempo in BPM.
pub const MAX_TEMPO: u32 = 240;

/// Tempo used before any score declares one.
pub const DEFAULT_TEMPO: u32 = 100;

type TempoObserver = Box<dyn FnMut(u32) + Send>;

/// Owns the current tempo value and its valid range.
pub struct TempoController {
    bpm: u32,
    observers: Vec<TempoObserver>,
}

impl TempoController {
    /// Create a controller at the default tempo.
    pub fn new() -> Self {
        Self::with_tempo(DEFAULT_TEMPO)
    }

    /// Create a controller at a specific starting tempo (clamped).
    pub fn with_tempo(bpm: u32) -> Self {
        Self {
            bpm: bpm.clamp(MIN_TEMPO, MAX_TEMPO),
            observers: Vec::new(),
        }
    }

    /// Current tempo in BPM. Always within `[MIN_TEMPO, MAX_TEMPO]`.
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Register a display observer, called with the resulting BPM on every
    /// `set` or `init_from_score`.
    pub fn on_change(&mut self, observer: impl FnMut(u32) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Set the tempo from a requested value.
    ///
    /// Finite input is clamped to `[MIN_TEMPO, MAX_TEMPO]` and rounded to
    /// the nearest integer; non-finite input keeps the previously held
    /// tempo. Returns the tempo now in effect.
    pub fn set(&mut self, requested: f64) -> u32 {
        if requested.is_finite() {
            self.bpm = requested.clamp(MIN_TEMPO as f64, MAX_TEMPO as f64).round() as u32;
            debug!(bpm = self.bpm, "tempo set");
        }
        self.notify();
        self.bpm
    }

    /// Adopt a tempo from score metadata on load.
    ///
    /// Prefers the score's declared tempo when it is positive and finite,
    /// then the sheet-level default under the same condition; otherwise the
    /// existing tempo is kept. Returns the tempo now in effect.
    pub fn init_from_score(&mut self, declared: Option<f64>, fallback: Option<f64>) -> u32 {
        let chosen = declared
            .filter(|t| t.is_finite() && *t > 0.0)
            .or_else(|| fallback.filter(|t| t.is_finite() && *t > 0.0));

        match chosen {
            Some(bpm) => self.set(bpm),
            None => self.bpm,
        }
    }

    fn notify(&mut self) {
        let bpm = self.bpm;
        for observer in &mut self.observers {
            observer(bpm);
        }
    }
}

impl Default for TempoController {
    fn default() -> Self {
        Self::new()
    }
}
