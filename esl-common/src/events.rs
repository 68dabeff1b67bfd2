//! Event types for the ESL controller event system
//!
//! `EslEvent` is what the controller publishes to UI subscribers. Every
//! variant carries a UTC timestamp so renderers and logs can order events
//! that arrive over different channels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Playback mode of the segment controller
///
/// Exactly one mode is active at a time. Changed only by explicit user
/// action or a programmatic mode force (e.g. click-to-repeat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Free playback; segment highlight follows the clock
    #[default]
    Normal,
    /// Play one segment, pause at its end, auto-advance after a delay
    Listen,
    /// Pin one segment; pause at its end; space restarts it
    Repeat,
    /// Pause after each segment for the learner to speak, then continue
    Shadowing,
}

impl PlaybackMode {
    /// All modes, in UI order
    pub const ALL: [PlaybackMode; 4] = [
        PlaybackMode::Normal,
        PlaybackMode::Listen,
        PlaybackMode::Repeat,
        PlaybackMode::Shadowing,
    ];

    /// Lowercase name used in config files and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackMode::Normal => "normal",
            PlaybackMode::Listen => "listen",
            PlaybackMode::Repeat => "repeat",
            PlaybackMode::Shadowing => "shadowing",
        }
    }

    /// Whether the controller plays segment-by-segment in this mode
    pub fn is_segment_driven(&self) -> bool {
        !matches!(self, PlaybackMode::Normal)
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(PlaybackMode::Normal),
            "listen" => Ok(PlaybackMode::Listen),
            "repeat" => Ok(PlaybackMode::Repeat),
            "shadowing" => Ok(PlaybackMode::Shadowing),
            other => Err(Error::InvalidInput(format!(
                "unknown playback mode '{}' (expected normal, listen, repeat or shadowing)",
                other
            ))),
        }
    }
}

/// ESL controller event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EslEvent {
    /// A new segment set was loaded (replaces the previous set wholesale)
    SegmentsLoaded {
        count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback mode changed
    ModeChanged {
        mode: PlaybackMode,
        previous: PlaybackMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Active (highlighted) segment changed
    ///
    /// `manual` is true when the change came from an explicit user pick
    /// rather than inference from the player clock.
    SegmentChanged {
        index: usize,
        previous: Option<usize>,
        manual: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Active word inside the current segment changed
    WordChanged {
        segment_index: usize,
        word_index: Option<usize>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Player started or stopped
    PlaybackStateChanged {
        playing: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Boundary watch reached a segment's computed end
    SegmentCompleted {
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Shadowing pause started after a segment finished
    ShadowingPauseStarted {
        index: usize,
        delay_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Shadowing pause elapsed and playback resumed
    ShadowingResumed {
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Shadowing delay adjusted by the user
    ShadowingDelayChanged {
        delay_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback rate changed
    PlaybackRateChanged {
        rate: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Volume or mute state changed
    VolumeChanged {
        volume: f64,
        muted: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl EslEvent {
    /// Event type name (matches the serde tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            EslEvent::SegmentsLoaded { .. } => "SegmentsLoaded",
            EslEvent::ModeChanged { .. } => "ModeChanged",
            EslEvent::SegmentChanged { .. } => "SegmentChanged",
            EslEvent::WordChanged { .. } => "WordChanged",
            EslEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            EslEvent::SegmentCompleted { .. } => "SegmentCompleted",
            EslEvent::ShadowingPauseStarted { .. } => "ShadowingPauseStarted",
            EslEvent::ShadowingResumed { .. } => "ShadowingResumed",
            EslEvent::ShadowingDelayChanged { .. } => "ShadowingDelayChanged",
            EslEvent::PlaybackRateChanged { .. } => "PlaybackRateChanged",
            EslEvent::VolumeChanged { .. } => "VolumeChanged",
        }
    }

    /// Event timestamp
    pub fn timestamp(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            EslEvent::SegmentsLoaded { timestamp, .. }
            | EslEvent::ModeChanged { timestamp, .. }
            | EslEvent::SegmentChanged { timestamp, .. }
            | EslEvent::WordChanged { timestamp, .. }
            | EslEvent::PlaybackStateChanged { timestamp, .. }
            | EslEvent::SegmentCompleted { timestamp, .. }
            | EslEvent::ShadowingPauseStarted { timestamp, .. }
            | EslEvent::ShadowingResumed { timestamp, .. }
            | EslEvent::ShadowingDelayChanged { timestamp, .. }
            | EslEvent::PlaybackRateChanged { timestamp, .. }
            | EslEvent::VolumeChanged { timestamp, .. } => *timestamp,
        }
    }
}
