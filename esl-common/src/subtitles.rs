//! Subtitle rendering for transcripts
//!
//! Cues use raw segment timing (not the playback-buffered windows), since
//! external players apply their own display logic.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::time::{format_srt_timestamp, format_vtt_timestamp};
use crate::{Error, Result, Segment};

/// Supported subtitle formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    WebVtt,
    Srt,
}

impl SubtitleFormat {
    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::WebVtt => "vtt",
            SubtitleFormat::Srt => "srt",
        }
    }
}

impl FromStr for SubtitleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vtt" | "webvtt" => Ok(SubtitleFormat::WebVtt),
            "srt" => Ok(SubtitleFormat::Srt),
            other => Err(Error::InvalidInput(format!(
                "unknown subtitle format '{}' (expected vtt or srt)",
                other
            ))),
        }
    }
}

/// Render segments as WebVTT
///
/// Cue numbers are sequential over non-empty segments. Speaker labels
/// become `<v NAME>` voice spans.
pub fn to_webvtt(segments: &[Segment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    let mut cue_id = 1;

    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }

        let voice = segment
            .speaker
            .as_deref()
            .map(|speaker| format!("<v {}>", speaker))
            .unwrap_or_default();

        let _ = write!(
            out,
            "{}\n{} --> {}\n{}{}\n\n",
            cue_id,
            format_vtt_timestamp(segment.start),
            format_vtt_timestamp(segment.end),
            voice,
            text
        );
        cue_id += 1;
    }

    out
}

/// Render segments as SubRip
pub fn to_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    let mut cue_id = 1;

    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }

        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            cue_id,
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            text
        );
        cue_id += 1;
    }

    out
}

/// Render segments in the requested format
pub fn render(segments: &[Segment], format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::WebVtt => to_webvtt(segments),
        SubtitleFormat::Srt => to_srt(segments),
    }
}

/// Render and write a subtitle file
pub async fn write_file(segments: &[Segment], format: SubtitleFormat, path: &Path) -> Result<()> {
    tokio::fs::write(path, render(segments, format)).await?;
    info!("Wrote {} subtitles to {:?}", format.extension(), path);
    Ok(())
}
