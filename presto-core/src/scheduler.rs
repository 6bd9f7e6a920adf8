//! Playback scheduler state machine
//!
//! [`PlaybackScheduler`] orchestrates playback: it resets and shows the
//! cursor on start, sounds the pitches under the cursor through an injected
//! [`ChordSink`], computes the delay to the next note-event from the
//! score's quarter-note timestamps at the current tempo, and arms an
//! injected one-shot [`StepTimer`] to advance. Steps run strictly
//! sequentially; the note-trigger order always matches the cursor
//! traversal order.
//!
//! All collaborators are supplied at construction. A scheduler without a
//! cursor refuses to start; a sink without an audio device simply stays
//! silent. Nothing here blocks or panics on partial renderer data.

use crate::cursor::ScoreCursor;
use crate::pitch::pitch_to_frequency;
use crate::tempo::TempoController;
use crate::timer::StepTimer;
use std::time::Duration;
use tracing::debug;

/// Step delta used when the cursor cannot report usable timestamps,
/// in quarter-note units.
pub const FALLBACK_DELTA_QUARTERS: f64 = 0.25;

/// Smallest allowed step delta (1/16 of a quarter note), so grace notes
/// and chords sharing a timestamp never produce degenerate intervals.
pub const MIN_DELTA_QUARTERS: f64 = 0.0625;

/// Fixed intensity passed to the sink for every chord.
pub const CHORD_INTENSITY: f32 = 0.9;

/// Playback lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Audio collaborator: turns a set of frequencies into a short cue tone.
///
/// Implementations must never fail; a missing audio backend degrades to a
/// silent no-op.
pub trait ChordSink {
    fn sound_chord(&mut self, frequencies: &[f32], intensity: f32);
}

/// Compute the scheduling delta between two peeked timestamps.
///
/// Absent, non-finite, or non-positive deltas fall back to
/// [`FALLBACK_DELTA_QUARTERS`]; positive deltas are floored at
/// [`MIN_DELTA_QUARTERS`].
pub fn delta_quarters(t0: Option<f64>, t1: Option<f64>) -> f64 {
    match (t0, t1) {
        (Some(t0), Some(t1)) => {
            let delta = t1 - t0;
            if delta.is_finite() && delta > 0.0 {
                delta.max(MIN_DELTA_QUARTERS)
            } else {
                FALLBACK_DELTA_QUARTERS
            }
        }
        _ => FALLBACK_DELTA_QUARTERS,
    }
}

/// The play/stop state machine driving cursor traversal and note cues.
pub struct PlaybackScheduler {
    state: PlaybackState,
    tempo: TempoController,
    cursor: Option<Box<dyn ScoreCursor>>,
    sink: Box<dyn ChordSink>,
    timer: Box<dyn StepTimer>,
    /// Identity of the pending armed step; fires carrying any other value
    /// are stale and ignored.
    generation: u64,
}

impl PlaybackScheduler {
    /// Create an idle scheduler at the default tempo. A cursor is attached
    /// separately once a renderer has loaded a score.
    pub fn new(sink: Box<dyn ChordSink>, timer: Box<dyn StepTimer>) -> Self {
        Self {
            state: PlaybackState::Idle,
            tempo: TempoController::new(),
            cursor: None,
            sink,
            timer,
            generation: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current tempo in BPM.
    pub fn tempo(&self) -> u32 {
        self.tempo.bpm()
    }

    /// Register a tempo-display observer (see [`TempoController::on_change`]).
    pub fn on_tempo_change(&mut self, observer: impl FnMut(u32) + Send + 'static) {
        self.tempo.on_change(observer);
    }

    /// The attached cursor, for host display purposes.
    pub fn cursor(&self) -> Option<&dyn ScoreCursor> {
        self.cursor.as_deref()
    }

    /// Attach the cursor supplied by the renderer. Stops any active
    /// playback first, since the old cursor is being replaced.
    pub fn attach_cursor(&mut self, cursor: Box<dyn ScoreCursor>) {
        self.stop();
        self.cursor = Some(cursor);
    }

    /// Detach and return the cursor. Stops active playback: a scheduler
    /// without a cursor cannot step.
    pub fn detach_cursor(&mut self) -> Option<Box<dyn ScoreCursor>> {
        self.stop();
        self.cursor.take()
    }

    /// Set the tempo from a requested value (clamped and rounded by the
    /// tempo controller). While playing, the pending step is cancelled and
    /// recomputed immediately at the new tempo from the unchanged cursor
    /// position; time already elapsed in the cancelled interval is not
    /// credited.
    pub fn set_tempo(&mut self, requested: f64) -> u32 {
        let bpm = self.tempo.set(requested);
        if self.state == PlaybackState::Playing {
            self.timer.cancel();
            self.step();
        }
        bpm
    }

    /// Adopt the tempo a freshly loaded score declares, falling back to
    /// the sheet default, else keeping the current tempo.
    pub fn init_tempo_from_score(
        &mut self,
        declared: Option<f64>,
        fallback: Option<f64>,
    ) -> u32 {
        let bpm = self.tempo.init_from_score(declared, fallback);
        if self.state == PlaybackState::Playing {
            self.timer.cancel();
            self.step();
        }
        bpm
    }

    /// Begin playback from the start of the score.
    ///
    /// No-op while already playing, and no-op when no cursor is attached.
    pub fn start(&mut self) {
        if self.state == PlaybackState::Playing {
            return;
        }
        let Some(cursor) = self.cursor.as_mut() else {
            debug!("start ignored: no cursor attached");
            return;
        };
        cursor.reset();
        cursor.show();
        self.state = PlaybackState::Playing;
        debug!(bpm = self.tempo.bpm(), "playback started");
        self.step();
    }

    /// Stop playback: cancel the pending step, hide the cursor, go Idle.
    /// Idempotent.
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Idle {
            return;
        }
        self.timer.cancel();
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.hide();
        }
        self.state = PlaybackState::Idle;
        debug!("playback stopped");
    }

    /// Deliver a timer fire. The host calls this when the armed step
    /// elapses; stale generations and fires arriving while Idle are
    /// ignored, which makes cancellation race-free.
    pub fn on_timer_fired(&mut self, generation: u64) {
        if self.state != PlaybackState::Playing || generation != self.generation {
            return;
        }
        let Some(cursor) = self.cursor.as_mut() else {
            self.stop();
            return;
        };
        cursor.next();
        if cursor.end_reached() {
            self.stop();
        } else {
            self.step();
        }
    }

    /// One scheduling step: sound the notes under the cursor, then arm the
    /// timer for the delay to the next note-event.
    fn step(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if self.cursor.is_none() {
            self.stop();
            return;
        }

        self.sound_current_notes();

        let delta = self.peek_delta_quarters();
        let seconds = (60.0 / self.tempo.bpm() as f64) * delta;
        self.generation += 1;
        debug!(
            generation = self.generation,
            delta, seconds, "step scheduled"
        );
        self.timer.arm(Duration::from_secs_f64(seconds), self.generation);
    }

    fn sound_current_notes(&mut self) {
        let Some(cursor) = self.cursor.as_ref() else {
            return;
        };
        let notes = cursor.current_notes();
        if notes.is_empty() {
            return;
        }
        let frequencies: Vec<f32> = notes
            .iter()
            .map(|note| pitch_to_frequency(note.half_tone))
            .collect();
        self.sink.sound_chord(&frequencies, CHORD_INTENSITY);
    }

    /// Look ahead one note-event without moving the visible position:
    /// `next()` then `previous()` restores the cursor exactly.
    fn peek_delta_quarters(&mut self) -> f64 {
        let Some(cursor) = self.cursor.as_mut() else {
            return FALLBACK_DELTA_QUARTERS;
        };
        let t0 = cursor.current_timestamp();
        cursor.next();
        let t1 = cursor.current_timestamp();
        cursor.previous();
        delta_quarters(t0, t1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::NoteEvent;
    use crate::score::{EventCursor, Score, TimedChord};
    use crate::timer::ManualTimer;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Sink that records every chord it is asked to sound.
    #[derive(Clone, Default)]
    struct RecordingSink {
        chords: Arc<Mutex<Vec<Vec<f32>>>>,
    }

    impl RecordingSink {
        fn chords(&self) -> Vec<Vec<f32>> {
            self.chords.lock().unwrap().clone()
        }
    }

    impl ChordSink for RecordingSink {
        fn sound_chord(&mut self, frequencies: &[f32], _intensity: f32) {
            self.chords.lock().unwrap().push(frequencies.to_vec());
        }
    }

    /// Cursor whose state the test can observe after handing it to the
    /// scheduler.
    #[derive(Clone)]
    struct SharedCursor(Arc<Mutex<EventCursor>>);

    impl SharedCursor {
        fn new(score: &Score) -> Self {
            Self(Arc::new(Mutex::new(score.cursor())))
        }

        fn position(&self) -> usize {
            self.0.lock().unwrap().position()
        }

        fn is_visible(&self) -> bool {
            self.0.lock().unwrap().is_visible()
        }
    }

    impl ScoreCursor for SharedCursor {
        fn reset(&mut self) {
            self.0.lock().unwrap().reset()
        }
        fn show(&mut self) {
            self.0.lock().unwrap().show()
        }
        fn hide(&mut self) {
            self.0.lock().unwrap().hide()
        }
        fn next(&mut self) {
            self.0.lock().unwrap().next()
        }
        fn previous(&mut self) {
            self.0.lock().unwrap().previous()
        }
        fn current_notes(&self) -> Vec<NoteEvent> {
            self.0.lock().unwrap().current_notes()
        }
        fn current_timestamp(&self) -> Option<f64> {
            self.0.lock().unwrap().current_timestamp()
        }
        fn end_reached(&self) -> bool {
            self.0.lock().unwrap().end_reached()
        }
    }

    /// Cursor that never reports a timestamp.
    struct TimestamplessCursor {
        inner: EventCursor,
    }

    impl ScoreCursor for TimestamplessCursor {
        fn reset(&mut self) {
            self.inner.reset()
        }
        fn show(&mut self) {
            self.inner.show()
        }
        fn hide(&mut self) {
            self.inner.hide()
        }
        fn next(&mut self) {
            self.inner.next()
        }
        fn previous(&mut self) {
            self.inner.previous()
        }
        fn current_notes(&self) -> Vec<NoteEvent> {
            self.inner.current_notes()
        }
        fn current_timestamp(&self) -> Option<f64> {
            None
        }
        fn end_reached(&self) -> bool {
            self.inner.end_reached()
        }
    }

    fn two_note_score() -> Score {
        Score::new(vec![
            TimedChord::new(0.0, &[69]),
            TimedChord::new(1.0, &[81]),
        ])
    }

    fn scheduler_with(
        score: &Score,
    ) -> (PlaybackScheduler, RecordingSink, ManualTimer, SharedCursor) {
        let sink = RecordingSink::default();
        let timer = ManualTimer::new();
        let cursor = SharedCursor::new(score);
        let mut scheduler =
            PlaybackScheduler::new(Box::new(sink.clone()), Box::new(timer.clone()));
        scheduler.attach_cursor(Box::new(cursor.clone()));
        (scheduler, sink, timer, cursor)
    }

    #[test]
    fn test_starts_idle() {
        let sink = RecordingSink::default();
        let scheduler =
            PlaybackScheduler::new(Box::new(sink), Box::new(ManualTimer::new()));
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(!scheduler.is_playing());
        assert_eq!(scheduler.tempo(), 100);
    }

    #[test]
    fn test_start_without_cursor_is_noop() {
        let sink = RecordingSink::default();
        let timer = ManualTimer::new();
        let mut scheduler =
            PlaybackScheduler::new(Box::new(sink.clone()), Box::new(timer.clone()));

        scheduler.start();

        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(timer.armed().is_none());
        assert!(sink.chords().is_empty());
    }

    #[test]
    fn test_start_sounds_first_chord_and_arms() {
        let score = two_note_score();
        let (mut scheduler, sink, timer, cursor) = scheduler_with(&score);

        scheduler.start();

        assert!(scheduler.is_playing());
        assert!(cursor.is_visible());
        assert_eq!(sink.chords(), vec![vec![880.0]]);

        // tempo 100, delta 1 quarter -> 0.6 s
        let armed = timer.armed().unwrap();
        assert_eq!(armed.delay, Duration::from_secs_f64(0.6));
        assert_eq!(armed.generation, 1);
    }

    #[test]
    fn test_start_while_playing_is_noop() {
        let score = two_note_score();
        let (mut scheduler, sink, timer, cursor) = scheduler_with(&score);

        scheduler.start();
        let fired = timer.take().unwrap();
        scheduler.on_timer_fired(fired.generation);
        assert_eq!(cursor.position(), 1);

        let armed_before = timer.armed();
        let chords_before = sink.chords().len();
        scheduler.start();

        // no reset, no re-arm, no extra chord
        assert_eq!(cursor.position(), 1);
        assert_eq!(timer.armed(), armed_before);
        assert_eq!(sink.chords().len(), chords_before);
    }

    #[test]
    fn test_fire_advances_and_sounds_next() {
        let score = two_note_score();
        let (mut scheduler, sink, timer, cursor) = scheduler_with(&score);

        scheduler.start();
        let fired = timer.take().unwrap();
        scheduler.on_timer_fired(fired.generation);

        assert_eq!(cursor.position(), 1);
        assert_eq!(sink.chords(), vec![vec![880.0], vec![1760.0]]);
        assert_eq!(timer.armed().unwrap().generation, 2);
    }

    #[test]
    fn test_end_of_score_stops_and_hides() {
        let score = two_note_score();
        let (mut scheduler, _sink, timer, cursor) = scheduler_with(&score);

        scheduler.start();
        let fired = timer.take().unwrap();
        scheduler.on_timer_fired(fired.generation);
        let fired = timer.take().unwrap();
        scheduler.on_timer_fired(fired.generation);

        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(!cursor.is_visible());
        assert!(timer.armed().is_none());
    }

    #[test]
    fn test_stop_cancels_pending_step() {
        let score = two_note_score();
        let (mut scheduler, sink, timer, cursor) = scheduler_with(&score);

        scheduler.start();
        let pending = timer.armed().unwrap();
        scheduler.stop();

        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(!cursor.is_visible());
        assert!(timer.armed().is_none());

        // a fire that was already in flight when stop() ran is ignored
        let chords_before = sink.chords().len();
        scheduler.on_timer_fired(pending.generation);
        assert_eq!(sink.chords().len(), chords_before);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let score = two_note_score();
        let (mut scheduler, _sink, _timer, _cursor) = scheduler_with(&score);
        scheduler.stop();
        scheduler.stop();
        assert_eq!(scheduler.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_tempo_change_while_playing_reschedules() {
        let score = two_note_score();
        let (mut scheduler, sink, timer, cursor) = scheduler_with(&score);

        scheduler.start();
        assert_eq!(timer.armed().unwrap().generation, 1);
        let stale = timer.armed().unwrap().generation;

        scheduler.set_tempo(120.0);

        // new generation, new delay at 120 BPM, cursor unmoved
        let armed = timer.armed().unwrap();
        assert_eq!(armed.generation, 2);
        assert_eq!(armed.delay, Duration::from_secs_f64(0.5));
        assert_eq!(cursor.position(), 0);

        // the cancelled step's fire is ignored
        let chords_before = sink.chords().len();
        scheduler.on_timer_fired(stale);
        assert_eq!(sink.chords().len(), chords_before);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_tempo_change_while_idle_does_not_arm() {
        let score = two_note_score();
        let (mut scheduler, _sink, timer, _cursor) = scheduler_with(&score);
        scheduler.set_tempo(120.0);
        assert_eq!(scheduler.tempo(), 120);
        assert!(timer.armed().is_none());
    }

    #[test]
    fn test_rest_is_silent_but_still_schedules() {
        let score = Score::new(vec![TimedChord::rest(0.0), TimedChord::new(1.0, &[69])]);
        let (mut scheduler, sink, timer, _cursor) = scheduler_with(&score);

        scheduler.start();

        assert!(sink.chords().is_empty());
        assert!(timer.armed().is_some());
    }

    #[test]
    fn test_shared_timestamp_uses_fallback_delta() {
        // chord split across two events at the same timestamp
        let score = Score::new(vec![
            TimedChord::new(0.0, &[60]),
            TimedChord::new(0.0, &[64]),
            TimedChord::new(1.0, &[67]),
        ]);
        let (mut scheduler, _sink, timer, _cursor) = scheduler_with(&score);

        scheduler.start();

        // delta 0 -> fallback 0.25 quarters at 100 BPM
        let armed = timer.armed().unwrap();
        assert_eq!(armed.delay, Duration::from_secs_f64(0.6 * 0.25));
    }

    #[test]
    fn test_missing_timestamps_use_fallback_delta() {
        let score = two_note_score();
        let sink = RecordingSink::default();
        let timer = ManualTimer::new();
        let mut scheduler =
            PlaybackScheduler::new(Box::new(sink), Box::new(timer.clone()));
        scheduler.attach_cursor(Box::new(TimestamplessCursor {
            inner: score.cursor(),
        }));

        scheduler.start();

        let armed = timer.armed().unwrap();
        assert_eq!(armed.delay, Duration::from_secs_f64(0.6 * 0.25));
    }

    #[test]
    fn test_detach_cursor_stops_playback() {
        let score = two_note_score();
        let (mut scheduler, _sink, timer, _cursor) = scheduler_with(&score);

        scheduler.start();
        let detached = scheduler.detach_cursor();

        assert!(detached.is_some());
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(timer.armed().is_none());

        // restart with no cursor refuses
        scheduler.start();
        assert_eq!(scheduler.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_delta_quarters_floor() {
        assert_eq!(delta_quarters(Some(0.0), Some(1.0)), 1.0);
        assert_eq!(delta_quarters(Some(0.0), Some(0.01)), MIN_DELTA_QUARTERS);
        assert_eq!(delta_quarters(Some(2.0), Some(2.0)), FALLBACK_DELTA_QUARTERS);
        assert_eq!(delta_quarters(Some(2.0), Some(1.0)), FALLBACK_DELTA_QUARTERS);
        assert_eq!(delta_quarters(None, Some(1.0)), FALLBACK_DELTA_QUARTERS);
        assert_eq!(delta_quarters(Some(1.0), None), FALLBACK_DELTA_QUARTERS);
        assert_eq!(
            delta_quarters(Some(0.0), Some(f64::INFINITY)),
            FALLBACK_DELTA_QUARTERS
        );
        assert_eq!(
            delta_quarters(Some(f64::NAN), Some(1.0)),
            FALLBACK_DELTA_QUARTERS
        );
    }

    #[test]
    fn test_delta_never_below_floor() {
        let pairs = [(0.0, 0.0), (0.0, 0.001), (0.5, 0.5625), (3.0, 7.0)];
        for (t0, t1) in pairs {
            assert!(delta_quarters(Some(t0), Some(t1)) >= MIN_DELTA_QUARTERS);
        }
    }
}
