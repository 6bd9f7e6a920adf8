//! Score traversal contract
//!
//! A renderer that has parsed and laid out a score exposes its note-event
//! sequence through [`ScoreCursor`]. The scheduler only ever talks to this
//! trait; it never inspects renderer internals.

/// A single pitch sounding at a cursor position.
///
/// The pitch is an integer semitone offset relative to the fixed reference
/// pitch (see [`crate::pitch`]). Produced fresh at each step and not
/// retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub half_tone: i32,
}

impl NoteEvent {
    pub fn new(half_tone: i32) -> Self {
        Self { half_tone }
    }
}

/// Traversal handle over the notated note-events of a score.
///
/// Supplied by the renderer, consumed by the scheduler. The position
/// advances monotonically during playback; the only backward movement is
/// the scheduler's lookahead peek, where `previous()` after `next()` must
/// restore the exact prior position.
pub trait ScoreCursor {
    /// Return the cursor to the start of the score.
    fn reset(&mut self);

    /// Make the visual position indicator visible.
    fn show(&mut self);

    /// Hide the visual position indicator.
    fn hide(&mut self);

    /// Move one note-event forward.
    fn next(&mut self);

    /// Move one note-event backward. Must exactly undo a preceding `next()`.
    fn previous(&mut self);

    /// Pitches sounding at the current position. May be empty (e.g. rests).
    fn current_notes(&self) -> Vec<NoteEvent>;

    /// Timestamp of the current position in quarter-note units,
    /// monotonically non-decreasing as the cursor advances.
    ///
    /// `None` when the renderer cannot report one; the scheduler falls back
    /// to its default step delta.
    fn current_timestamp(&self) -> Option<f64>;

    /// True once the cursor has passed the final note-event.
    fn end_reached(&self) -> bool;
}
