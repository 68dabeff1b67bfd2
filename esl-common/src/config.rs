//! Configuration loading and config file resolution
//!
//! The config file is TOML with two tables:
//!
//! ```toml
//! [playback]
//! debounce_ms = 250
//! shadowing_delay_secs = 2.0
//! shadowing_continuation = "advance"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every key is optional; missing keys take built-in defaults. A missing
//! file is not an error (warning + defaults), a malformed one is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ESL_PLAYER_CONFIG";

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "esl-player";

/// File name of the config file
const CONFIG_FILE_NAME: &str = "config.toml";

/// What Shadowing mode does when its pause elapses
///
/// The player variants this product grew from disagreed; the choice is a
/// product setting rather than a hardcoded behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowingContinuation {
    /// Resume into the next segment
    #[default]
    Advance,
    /// Replay the segment that just finished
    Replay,
}

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Segment playback tunables
    #[serde(default)]
    pub playback: PlaybackSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Segment playback tunables
///
/// Times in seconds are `f64` (media clock units); timer periods are
/// integer milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Lead-in before the first word (or raw start)
    pub lead_buffer_secs: f64,

    /// Tail after the last word (or raw end when no word timing)
    pub trail_buffer_secs: f64,

    /// Tail after the raw segment end when word timing is distrusted
    pub min_trail_buffer_secs: f64,

    /// Word-end to segment-end gap above which word timing is distrusted
    pub word_distrust_gap_secs: f64,

    /// Gap above which the later of word/segment based ends is used
    pub word_moderate_gap_secs: f64,

    /// Settle time before a clock-inferred segment change is committed
    pub debounce_ms: u64,

    /// Boundary watch polling period
    pub boundary_poll_interval_ms: u64,

    /// Delay before the first boundary poll (lets playback start)
    pub boundary_watch_delay_ms: u64,

    /// Listen mode pause between a finished segment and the next one
    pub listen_advance_delay_ms: u64,

    /// Default shadowing pause
    pub shadowing_delay_secs: f64,

    /// Shadowing pause lower bound
    pub shadowing_delay_min_secs: f64,

    /// Shadowing pause upper bound
    pub shadowing_delay_max_secs: f64,

    /// Shadowing pause adjustment step
    pub shadowing_delay_step_secs: f64,

    /// What happens when the shadowing pause elapses
    pub shadowing_continuation: ShadowingContinuation,

    /// Playback rate lower bound
    pub min_playback_rate: f64,

    /// Playback rate upper bound
    pub max_playback_rate: f64,

    /// Repeat mode: a paused position within this distance of the end
    /// counts as "at the end" and restarts the segment
    pub repeat_restart_tolerance_secs: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            lead_buffer_secs: 0.15,
            trail_buffer_secs: 0.3,
            min_trail_buffer_secs: 0.15,
            word_distrust_gap_secs: 0.5,
            word_moderate_gap_secs: 0.1,
            debounce_ms: 250,
            boundary_poll_interval_ms: 50,
            boundary_watch_delay_ms: 100,
            listen_advance_delay_ms: 1500,
            shadowing_delay_secs: 2.0,
            shadowing_delay_min_secs: 0.5,
            shadowing_delay_max_secs: 10.0,
            shadowing_delay_step_secs: 0.5,
            shadowing_continuation: ShadowingContinuation::Advance,
            min_playback_rate: 0.25,
            max_playback_rate: 4.0,
            repeat_restart_tolerance_secs: 0.1,
        }
    }
}

impl PlaybackSettings {
    /// Check ranges and cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("lead_buffer_secs", self.lead_buffer_secs),
            ("trail_buffer_secs", self.trail_buffer_secs),
            ("min_trail_buffer_secs", self.min_trail_buffer_secs),
            ("word_distrust_gap_secs", self.word_distrust_gap_secs),
            ("word_moderate_gap_secs", self.word_moderate_gap_secs),
            ("repeat_restart_tolerance_secs", self.repeat_restart_tolerance_secs),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "playback.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.word_moderate_gap_secs > self.word_distrust_gap_secs {
            return Err(Error::Config(format!(
                "playback.word_moderate_gap_secs ({}) exceeds word_distrust_gap_secs ({})",
                self.word_moderate_gap_secs, self.word_distrust_gap_secs
            )));
        }

        if self.boundary_poll_interval_ms == 0 {
            return Err(Error::Config(
                "playback.boundary_poll_interval_ms must be positive".to_string(),
            ));
        }

        let min = self.shadowing_delay_min_secs;
        let max = self.shadowing_delay_max_secs;
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(Error::Config(format!(
                "playback shadowing delay range [{}, {}] is invalid",
                min, max
            )));
        }
        if !(min..=max).contains(&self.shadowing_delay_secs) {
            return Err(Error::Config(format!(
                "playback.shadowing_delay_secs ({}) outside [{}, {}]",
                self.shadowing_delay_secs, min, max
            )));
        }
        if !(self.shadowing_delay_step_secs.is_finite() && self.shadowing_delay_step_secs > 0.0) {
            return Err(Error::Config(
                "playback.shadowing_delay_step_secs must be positive".to_string(),
            ));
        }

        let (rate_min, rate_max) = (self.min_playback_rate, self.max_playback_rate);
        if !(rate_min.is_finite() && rate_max.is_finite() && rate_min > 0.0 && rate_min <= rate_max)
        {
            return Err(Error::Config(format!(
                "playback rate range [{}, {}] is invalid",
                rate_min, rate_max
            )));
        }

        Ok(())
    }
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(text)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.playback.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional path
    ///
    /// `None` or a path that does not exist yields defaults with a warning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No config file, using built-in defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Config file {:?} not found, using built-in defaults", path);
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`ESL_PLAYER_CONFIG`)
/// 3. Platform config file, if it exists
/// 4. None (built-in defaults)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|path| path.exists())
}

/// Platform config file location (`<config dir>/esl-player/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
