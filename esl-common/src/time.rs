//! Timestamp and media-time utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Convert fractional seconds to duration
///
/// Negative and non-finite inputs map to zero; media clocks hand us
/// floats and a stray NaN must not panic a timer.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Split media seconds into (hours, minutes, seconds, milliseconds)
fn split_media_time(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    (hours, minutes, secs, millis)
}

/// Format media time as a WebVTT timestamp (`HH:MM:SS.mmm`)
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_media_time(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

/// Format media time as an SRT timestamp (`HH:MM:SS,mmm`)
pub fn format_srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_media_time(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Format media time for player controls (`M:SS`, truncated)
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
