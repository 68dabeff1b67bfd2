//! # ESL Segment Player Library (esl-player)
//!
//! Segment-synchronized playback controller for ESL listening practice.
//!
//! **Purpose:** Map a media player's clock onto transcript segments, keep the
//! highlighted segment stable, and drive Normal / Listen / Repeat / Shadowing
//! behavior at segment boundaries.
//!
//! **Architecture:** One [`SegmentController`] per media item owns every
//! mutation of an externally owned [`MediaPlayer`]. Waits (boundary watch,
//! debounce, shadowing pause, listen auto-advance) are scoped tokio timers
//! that are cancelled when superseded or on teardown. UI layers subscribe
//! to [`esl_common::EslEvent`]s and [`PlaybackSnapshot`]s.

pub mod config;
pub mod error;
pub mod playback;
pub mod player;
pub mod state;

pub use config::ControllerConfig;
pub use error::{Error, Result};
pub use playback::SegmentController;
pub use player::{MediaPlayer, PlayerEvent, SimulatedPlayer};
pub use state::{PlaybackSnapshot, SharedState};
