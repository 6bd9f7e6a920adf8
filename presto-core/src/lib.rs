//! # Presto Core
//!
//! Platform-independent playback logic for the Presto score player.
//! Provides tempo control, the score-cursor contract, the playback
//! scheduler state machine, and the step-timer contract, without any
//! audio-device or rendering dependencies.
//!
//! The scheduler walks a renderer-supplied cursor over the notated
//! note-events of a score, sounds the pitches under the cursor through an
//! injected [`ChordSink`], and computes each inter-step delay from the
//! score's quarter-note timestamps at the current tempo.
//!
//! ## Modules
//!
//! - `tempo`: BPM ownership, clamping, and score-derived initialization.
//! - `cursor`: the traversal contract a renderer must supply.
//! - `scheduler`: the Idle/Playing state machine driving playback.
//! - `timer`: the cancellable one-shot step timer contract, plus a
//!   deterministic manual implementation for tests and virtual-time hosts.
//! - `score`: an in-memory score and cursor for hosts and tests.
//! - `renderer`: the external renderer collaborator contract.
//! - `pitch`: equal-tempered semitone-to-frequency conversion.

pub mod cursor;
pub mod pitch;
pub mod renderer;
pub mod scheduler;
pub mod score;
pub mod tempo;
pub mod timer;

// Re-export commonly used types
pub use cursor::{NoteEvent, ScoreCursor};
pub use pitch::pitch_to_frequency;
pub use renderer::{RenderError, ScoreMetadata, ScoreRenderer, ScoreSource};
pub use scheduler::{ChordSink, PlaybackScheduler, PlaybackState};
pub use score::{EventCursor, Score, TimedChord};
pub use tempo::TempoController;
pub use timer::{ArmedStep, ManualTimer, StepTimer};
