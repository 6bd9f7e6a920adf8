//! In-memory score events and cursor
//!
//! A minimal concrete score representation: a sequence of timestamped
//! chords plus the tempo metadata a renderer would report after parsing.
//! [`EventCursor`] implements the full [`ScoreCursor`] contract over it.
//! Hosts without a graphical renderer (the demo binary, the test suite)
//! traverse scores through this type.

use crate::cursor::{NoteEvent, ScoreCursor};

/// Notes sounding together at one score position.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedChord {
    /// Position in quarter-note units from the start of the score.
    pub timestamp: f64,
    /// Pitches at this position. Empty for a rest.
    pub notes: Vec<NoteEvent>,
}

impl TimedChord {
    pub fn new(timestamp: f64, half_tones: &[i32]) -> Self {
        Self {
            timestamp,
            notes: half_tones.iter().copied().map(NoteEvent::new).collect(),
        }
    }

    /// A rest: a position with no sounding pitches.
    pub fn rest(timestamp: f64) -> Self {
        Self {
            timestamp,
            notes: Vec::new(),
        }
    }
}

/// An in-memory score: ordered timed chords plus tempo metadata.
#[derive(Debug, Clone, Default)]
pub struct Score {
    events: Vec<TimedChord>,
    /// Tempo declared in the score's first measure, if any.
    pub declared_tempo: Option<f64>,
    /// Sheet-level default tempo, if any.
    pub default_tempo: Option<f64>,
}

impl Score {
    /// Build a score from events, sorting them by timestamp.
    pub fn new(mut events: Vec<TimedChord>) -> Self {
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self {
            events,
            declared_tempo: None,
            default_tempo: None,
        }
    }

    pub fn with_declared_tempo(mut self, bpm: f64) -> Self {
        self.declared_tempo = Some(bpm);
        self
    }

    pub fn with_default_tempo(mut self, bpm: f64) -> Self {
        self.default_tempo = Some(bpm);
        self
    }

    pub fn events(&self) -> &[TimedChord] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Create a cursor positioned at the start of this score.
    pub fn cursor(&self) -> EventCursor {
        EventCursor::new(self.events.clone())
    }
}

/// Concrete [`ScoreCursor`] over an event list.
///
/// The position ranges over `0..=len`; `len` is the past-the-end position
/// where [`ScoreCursor::end_reached`] reports true.
#[derive(Debug, Clone)]
pub struct EventCursor {
    events: Vec<TimedChord>,
    position: usize,
    visible: bool,
}

impl EventCursor {
    pub fn new(events: Vec<TimedChord>) -> Self {
        Self {
            events,
            position: 0,
            visible: false,
        }
    }

    /// Index of the current note-event (equals the event count at the end).
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the visual indicator is currently shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl ScoreCursor for EventCursor {
    fn reset(&mut self) {
        self.position = 0;
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn next(&mut self) {
        if self.position < self.events.len() {
            self.position += 1;
        }
    }

    fn previous(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    fn current_notes(&self) -> Vec<NoteEvent> {
        self.events
            .get(self.position)
            .map(|event| event.notes.clone())
            .unwrap_or_default()
    }

    fn current_timestamp(&self) -> Option<f64> {
        self.events.get(self.position).map(|event| event.timestamp)
    }

    fn end_reached(&self) -> bool {
        self.position >= self.events.len()
    }
}
