//! Transport controls: seek, rate, volume, shadowing delay

use esl_common::{time, EslEvent};
use std::time::Duration;
use tracing::debug;

use super::core::{ControllerInner, SegmentController, UNMUTE_FALLBACK_VOLUME};

impl ControllerInner {
    fn seek(&mut self, seconds: f64) {
        let Some(player) = &self.player else {
            return;
        };
        if !seconds.is_finite() {
            return;
        }
        let target = seconds.clamp(0.0, player.duration().max(0.0));
        player.seek(target);
        self.follow_seek(target);
    }

    fn skip(&mut self, delta: f64) {
        let Some(now) = self.player.as_ref().map(|p| p.current_time()) else {
            return;
        };
        self.seek(now + delta);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        let Some(player) = &self.player else {
            return;
        };
        let rate = self.config.clamp_playback_rate(rate);
        if (player.playback_rate() - rate).abs() < f64::EPSILON {
            return;
        }
        player.set_playback_rate(rate);
        debug!("Playback rate set to {:.2}", rate);
        self.emit(EslEvent::PlaybackRateChanged {
            rate,
            timestamp: time::now(),
        });
    }

    fn set_volume(&mut self, volume: f64) {
        let Some(player) = self.player.clone() else {
            return;
        };
        if !volume.is_finite() {
            return;
        }
        player.set_volume(volume.clamp(0.0, 1.0));
        self.muted = false;
        self.emit_volume();
    }

    fn toggle_mute(&mut self) {
        let Some(player) = self.player.clone() else {
            return;
        };
        if self.muted {
            let restore = if self.pre_mute_volume > 0.0 {
                self.pre_mute_volume
            } else {
                UNMUTE_FALLBACK_VOLUME
            };
            player.set_volume(restore);
            self.muted = false;
        } else {
            self.pre_mute_volume = player.volume();
            player.set_volume(0.0);
            self.muted = true;
        }
        self.emit_volume();
    }

    fn emit_volume(&self) {
        let volume = self.player.as_ref().map_or(0.0, |p| p.volume());
        self.emit(EslEvent::VolumeChanged {
            volume,
            muted: self.muted,
            timestamp: time::now(),
        });
    }

    fn set_shadowing_delay(&mut self, delay: Duration) {
        let delay = self.config.clamp_shadowing_delay(delay);
        if delay == self.shadowing_delay {
            return;
        }
        self.shadowing_delay = delay;
        debug!("Shadowing delay set to {:?}", delay);
        self.emit(EslEvent::ShadowingDelayChanged {
            delay_ms: delay.as_millis() as u64,
            timestamp: time::now(),
        });
    }

    fn adjust_shadowing_delay(&mut self, steps: i32) {
        let step = self
            .config
            .shadowing_delay_step
            .checked_mul(steps.unsigned_abs())
            .unwrap_or(Duration::MAX);
        let delay = if steps >= 0 {
            self.shadowing_delay.saturating_add(step)
        } else {
            self.shadowing_delay.saturating_sub(step)
        };
        self.set_shadowing_delay(delay);
    }
}

impl SegmentController {
    /// Seek the player, clamped to `[0, duration]`
    pub async fn seek(&self, seconds: f64) {
        self.apply(|inner| inner.seek(seconds)).await;
    }

    /// Seek relative to the current position
    pub async fn skip(&self, delta_secs: f64) {
        self.apply(|inner| inner.skip(delta_secs)).await;
    }

    /// Set the playback rate, clamped to the configured range
    pub async fn set_playback_rate(&self, rate: f64) {
        self.apply(|inner| inner.set_playback_rate(rate)).await;
    }

    /// Set the volume (0.0-1.0); unmutes
    pub async fn set_volume(&self, volume: f64) {
        self.apply(|inner| inner.set_volume(volume)).await;
    }

    /// Mute, or restore the pre-mute volume
    pub async fn toggle_mute(&self) {
        self.apply(ControllerInner::toggle_mute).await;
    }

    /// Set the shadowing pause length, clamped to the configured range
    ///
    /// Applies from the next pause on.
    pub async fn set_shadowing_delay(&self, delay: Duration) {
        self.apply(|inner| inner.set_shadowing_delay(delay)).await;
    }

    /// Change the shadowing pause by whole steps (negative shortens)
    pub async fn adjust_shadowing_delay(&self, steps: i32) {
        self.apply(|inner| inner.adjust_shadowing_delay(steps)).await;
    }
}
