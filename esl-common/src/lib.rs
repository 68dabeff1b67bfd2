//! # ESL Common Library
//!
//! Shared code for the ESL segment player crates including:
//! - Transcript data model and JSON loading
//! - Event types (EslEvent enum) and playback modes
//! - Configuration loading and path resolution
//! - Subtitle rendering (WebVTT, SRT)
//! - Time formatting utilities

pub mod config;
pub mod error;
pub mod events;
pub mod subtitles;
pub mod time;
pub mod transcript;

pub use error::{Error, Result};
pub use events::{EslEvent, PlaybackMode};
pub use transcript::{Segment, Transcript, Word};
