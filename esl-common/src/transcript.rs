//! Transcript data model and loading
//!
//! Transcripts arrive as WhisperX-style JSON:
//!
//! ```json
//! { "language": "en",
//!   "segments": [
//!     { "start": 0.0, "end": 2.5, "text": " Hello there.",
//!       "words": [ { "word": "Hello", "start": 0.1, "end": 0.6, "score": 0.98 } ] } ] }
//! ```
//!
//! Loading normalizes the segment list into the shape the controller
//! relies on: sorted by start, indices equal to positions, `start < end`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// A single transcribed word
///
/// Timing is optional on the wire: the aligner leaves some tokens
/// (numerals, symbols) untimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text
    #[serde(alias = "word")]
    pub text: String,

    /// Start time in seconds
    #[serde(default)]
    pub start: Option<f64>,

    /// End time in seconds
    #[serde(default)]
    pub end: Option<f64>,

    /// Alignment confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Word {
    /// Create a timed word
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            end: Some(end),
            score: None,
        }
    }

    /// Both bounds, when present and finite
    pub fn timing(&self) -> Option<(f64, f64)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start.is_finite() && end.is_finite() => Some((start, end)),
            _ => None,
        }
    }
}

/// A time-bounded unit of transcript text (one subtitle cue)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the transcript (reassigned on load)
    #[serde(default)]
    pub index: usize,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Cue text
    #[serde(default)]
    pub text: String,

    /// Word-level timing, when the aligner produced it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,

    /// Diarization label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl Segment {
    /// Create a segment without word timing
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
            words: Vec::new(),
            speaker: None,
        }
    }

    /// Attach word timing
    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }

    /// Words that carry usable timing, in order
    pub fn timed_words(&self) -> impl Iterator<Item = (usize, &Word)> {
        self.words.iter().enumerate().filter(|(_, w)| w.timing().is_some())
    }

    /// Whether any word carries usable timing
    pub fn has_word_timing(&self) -> bool {
        self.timed_words().next().is_some()
    }
}

/// A full transcript for one media item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Parse transcript JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let mut transcript: Transcript = serde_json::from_str(json)?;
        transcript.segments = normalize_segments(std::mem::take(&mut transcript.segments))?;
        debug!(
            "Parsed transcript: {} segments, word timing: {}",
            transcript.segments.len(),
            transcript.segments.iter().any(Segment::has_word_timing)
        );
        Ok(transcript)
    }

    /// Load transcript JSON from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        let transcript = Self::from_json(&json)?;
        info!(
            "Loaded transcript {:?} ({} segments)",
            path,
            transcript.segments.len()
        );
        Ok(transcript)
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the transcript has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Validate, sort and reindex a segment list
///
/// Sorting is stable so segments sharing a start keep their order.
pub fn normalize_segments(segments: Vec<Segment>) -> Result<Vec<Segment>> {
    for (position, segment) in segments.iter().enumerate() {
        if let Some(problem) = segment_problem(segment) {
            return Err(Error::InvalidInput(format!("segment {} {}", position, problem)));
        }
    }
    Ok(order_segments(segments))
}

/// Like [`normalize_segments`], but drops invalid segments instead of failing
pub fn sanitize_segments(segments: Vec<Segment>) -> Vec<Segment> {
    let valid = segments
        .into_iter()
        .enumerate()
        .filter_map(|(position, segment)| match segment_problem(&segment) {
            Some(problem) => {
                warn!("Dropping segment {}: {}", position, problem);
                None
            }
            None => Some(segment),
        })
        .collect();
    order_segments(valid)
}

fn segment_problem(segment: &Segment) -> Option<String> {
    if !segment.start.is_finite() || !segment.end.is_finite() {
        return Some("has non-finite bounds".to_string());
    }
    if segment.start >= segment.end {
        return Some(format!(
            "has start {:.3} >= end {:.3}",
            segment.start, segment.end
        ));
    }
    None
}

fn order_segments(mut segments: Vec<Segment>) -> Vec<Segment> {
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    for (index, segment) in segments.iter_mut().enumerate() {
        segment.index = index;
        let trimmed = segment.text.trim();
        if trimmed.len() != segment.text.len() {
            segment.text = trimmed.to_string();
        }
    }
    segments
}
