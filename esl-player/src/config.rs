//! esl-player runtime configuration
//!
//! `esl_common::config::PlaybackSettings` is the on-disk shape (plain
//! seconds and milliseconds); `ControllerConfig` is what the controller
//! runs on (validated, with timer periods as `Duration`s).

use esl_common::config::{PlaybackSettings, ShadowingContinuation};
use esl_common::time::{millis_to_duration, secs_to_duration};
use std::time::Duration;

use crate::error::Result;

/// Segment window buffers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    /// Seconds of lead-in before the first word / raw start
    pub lead_buffer: f64,
    /// Seconds of tail after the last word / raw end
    pub trail_buffer: f64,
    /// Seconds of tail after the raw end when word timing is distrusted
    pub min_trail_buffer: f64,
    /// Word-end to segment-end gap above which word timing is distrusted
    pub distrust_gap: f64,
    /// Gap above which the later end wins
    pub moderate_gap: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::from(&PlaybackSettings::default())
    }
}

impl From<&PlaybackSettings> for TimingConfig {
    fn from(settings: &PlaybackSettings) -> Self {
        Self {
            lead_buffer: settings.lead_buffer_secs,
            trail_buffer: settings.trail_buffer_secs,
            min_trail_buffer: settings.min_trail_buffer_secs,
            distrust_gap: settings.word_distrust_gap_secs,
            moderate_gap: settings.word_moderate_gap_secs,
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub timing: TimingConfig,
    pub debounce: Duration,
    pub boundary_poll_interval: Duration,
    pub boundary_watch_delay: Duration,
    pub listen_advance_delay: Duration,
    pub shadowing_delay: Duration,
    pub shadowing_delay_min: Duration,
    pub shadowing_delay_max: Duration,
    pub shadowing_delay_step: Duration,
    pub shadowing_continuation: ShadowingContinuation,
    pub min_playback_rate: f64,
    pub max_playback_rate: f64,
    pub repeat_restart_tolerance: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from(&PlaybackSettings::default())
    }
}

impl From<&PlaybackSettings> for ControllerConfig {
    fn from(settings: &PlaybackSettings) -> Self {
        Self {
            timing: TimingConfig::from(settings),
            debounce: millis_to_duration(settings.debounce_ms),
            boundary_poll_interval: millis_to_duration(settings.boundary_poll_interval_ms),
            boundary_watch_delay: millis_to_duration(settings.boundary_watch_delay_ms),
            listen_advance_delay: millis_to_duration(settings.listen_advance_delay_ms),
            shadowing_delay: secs_to_duration(settings.shadowing_delay_secs),
            shadowing_delay_min: secs_to_duration(settings.shadowing_delay_min_secs),
            shadowing_delay_max: secs_to_duration(settings.shadowing_delay_max_secs),
            shadowing_delay_step: secs_to_duration(settings.shadowing_delay_step_secs),
            shadowing_continuation: settings.shadowing_continuation,
            min_playback_rate: settings.min_playback_rate,
            max_playback_rate: settings.max_playback_rate,
            repeat_restart_tolerance: settings.repeat_restart_tolerance_secs,
        }
    }
}

impl ControllerConfig {
    /// Build from validated settings
    pub fn from_settings(settings: &PlaybackSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from(settings))
    }

    /// Clamp a shadowing delay into the configured range
    pub fn clamp_shadowing_delay(&self, delay: Duration) -> Duration {
        delay.clamp(self.shadowing_delay_min, self.shadowing_delay_max)
    }

    /// Clamp a playback rate into the configured range
    pub fn clamp_playback_rate(&self, rate: f64) -> f64 {
        if rate.is_finite() {
            rate.clamp(self.min_playback_rate, self.max_playback_rate)
        } else {
            1.0_f64.clamp(self.min_playback_rate, self.max_playback_rate)
        }
    }
}
