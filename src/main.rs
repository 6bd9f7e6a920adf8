//! Demo host: plays a built-in score (or a simple text score file)
//! through the playback scheduler.
//!
//! Usage: `presto [FILE] [BPM]`
//!
//! The score format is host-side glue, one note-event per line:
//! `<timestamp-in-quarters> <semitone> [<semitone>...]`, an optional
//! `tempo <bpm>` header, `#` comments, and bare timestamps for rests.

use anyhow::{anyhow, Result};
use colored::Colorize;
use crossbeam_channel::RecvTimeoutError;
use presto::synth::AudioSynthesizer;
use presto::timer::ThreadTimer;
use presto_core::{
    PlaybackScheduler, RenderError, Score, ScoreCursor, ScoreMetadata, ScoreRenderer,
    ScoreSource, TimedChord,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Ode to Joy, first phrase. Semitone offsets against the reference pitch.
const DEMO_SCORE: &str = "\
tempo 120
# timestamp  pitches
0    64
1    64
2    65
3    67
4    67
5    65
6    64
7    62
8    60
9    60
10   62
11   64
12   64
13.5 62
14   62
";

/// Renderer for the demo's line-based score text.
#[derive(Default)]
struct DemoRenderer {
    score: Option<Score>,
}

impl ScoreRenderer for DemoRenderer {
    fn load(&mut self, source: ScoreSource) -> Result<ScoreMetadata, RenderError> {
        let text = match source {
            ScoreSource::Text(text) => text,
            ScoreSource::Binary(_) => {
                return Err(RenderError::Unsupported("binary demo scores".into()))
            }
        };
        let score = parse_score(&text)?;
        let metadata = ScoreMetadata {
            declared_tempo: score.declared_tempo,
            default_tempo: score.default_tempo,
        };
        self.score = Some(score);
        Ok(metadata)
    }

    fn cursor(&mut self) -> Option<Box<dyn ScoreCursor>> {
        self.score
            .as_ref()
            .map(|score| Box::new(score.cursor()) as Box<dyn ScoreCursor>)
    }
}

fn parse_score(text: &str) -> Result<Score, RenderError> {
    let mut declared_tempo = None;
    let mut events = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(bpm) = line.strip_prefix("tempo ") {
            declared_tempo = Some(bpm.trim().parse::<f64>().map_err(|e| {
                RenderError::Malformed(format!("line {}: bad tempo: {}", index + 1, e))
            })?);
            continue;
        }

        let mut fields = line.split_whitespace();
        let timestamp = fields
            .next()
            .ok_or_else(|| RenderError::Malformed(format!("line {}: empty event", index + 1)))?
            .parse::<f64>()
            .map_err(|e| {
                RenderError::Malformed(format!("line {}: bad timestamp: {}", index + 1, e))
            })?;
        let notes = fields
            .map(|field| {
                field.parse::<i32>().map_err(|e| {
                    RenderError::Malformed(format!("line {}: bad pitch: {}", index + 1, e))
                })
            })
            .collect::<Result<Vec<i32>, RenderError>>()?;
        events.push(TimedChord::new(timestamp, &notes));
    }

    let mut score = Score::new(events);
    score.declared_tempo = declared_tempo;
    Ok(score)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // numeric args are a BPM override, anything else is a score file
    let mut source_text = DEMO_SCORE.to_string();
    let mut bpm_request = None;
    for arg in std::env::args().skip(1) {
        if let Ok(bpm) = arg.parse::<f64>() {
            bpm_request = Some(bpm);
        } else {
            source_text = std::fs::read_to_string(&arg)?;
        }
    }

    let mut renderer = DemoRenderer::default();
    let metadata = renderer.load(ScoreSource::Text(source_text))?;

    let (timer, fired_rx) = ThreadTimer::new();
    let mut scheduler =
        PlaybackScheduler::new(Box::new(AudioSynthesizer::new()), Box::new(timer));
    scheduler.on_tempo_change(|bpm| println!("{} {} BPM", "tempo".cyan(), bpm));
    scheduler.attach_cursor(
        renderer
            .cursor()
            .ok_or_else(|| anyhow!("renderer produced no cursor"))?,
    );
    scheduler.init_tempo_from_score(metadata.declared_tempo, metadata.default_tempo);
    if let Some(bpm) = bpm_request {
        scheduler.set_tempo(bpm);
    }

    println!("{}", "playing...".bold());
    scheduler.start();
    if !scheduler.is_playing() {
        return Err(anyhow!("nothing to play"));
    }

    while scheduler.is_playing() {
        match fired_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(fired) => {
                scheduler.on_timer_fired(fired.generation);
                if let Some(timestamp) =
                    scheduler.cursor().and_then(|cursor| cursor.current_timestamp())
                {
                    println!("{} {:>6.2} quarters", "at".dimmed(), timestamp);
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    println!("{}", "done".green());
    Ok(())
}
