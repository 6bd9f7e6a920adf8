//! Renderer collaborator contract
//!
//! The renderer is the external component that parses and visually lays
//! out score data, then exposes a cursor over it. The core never performs
//! I/O: the host obtains the score bytes (network fetch, local file) and
//! hands them over as a [`ScoreSource`]. A failed load is fatal to that
//! render attempt only and is never retried by the core.

use crate::cursor::ScoreCursor;
use thiserror::Error;

/// Score data as obtained by the host.
#[derive(Debug, Clone)]
pub enum ScoreSource {
    /// Textual notation data (e.g. uncompressed XML notation).
    Text(String),
    /// Binary notation data (e.g. a compressed score container).
    Binary(Vec<u8>),
}

/// Tempo metadata a renderer reports after a successful load.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreMetadata {
    /// Tempo declared in the score's first measure, if any.
    pub declared_tempo: Option<f64>,
    /// Sheet-level default tempo, if any.
    pub default_tempo: Option<f64>,
}

/// A failed render attempt.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("malformed score data: {0}")]
    Malformed(String),
    #[error("unsupported score format: {0}")]
    Unsupported(String),
}

/// External renderer: parses and lays out score data, exposes a cursor.
pub trait ScoreRenderer {
    /// Parse and lay out the given score data, returning its tempo
    /// metadata. Replaces any previously loaded score.
    fn load(&mut self, source: ScoreSource) -> Result<ScoreMetadata, RenderError>;

    /// A cursor over the currently loaded score, or `None` when no score
    /// has been loaded successfully.
    fn cursor(&mut self) -> Option<Box<dyn ScoreCursor>>;
}
