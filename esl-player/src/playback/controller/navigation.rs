//! Mode transitions, segment navigation and clock-driven inference
//!
//! **Responsibilities:**
//! - `on_time_update`: segment inference (debounced) and word highlighting
//! - `set_mode` per the mode state machine
//! - `go_to_segment`, `play_segment`, `previous`/`next`
//! - `toggle_play_pause` (per-mode user action)

use esl_common::{time, EslEvent, PlaybackMode};
use tracing::{debug, trace};

use super::core::{ControllerInner, SegmentController, TimerKind};
use crate::playback::timer::ScopedTimer;
use crate::playback::words::resolve_word;

impl ControllerInner {
    pub(super) fn on_time_update(&mut self, t: f64) {
        if !t.is_finite() || self.timeline.is_empty() {
            return;
        }

        // Repeat pins the segment; a manual pick holds while paused
        let pinned = self.mode == PlaybackMode::Repeat
            || (self.manual_selection && !self.player_running());
        if !pinned {
            self.infer_segment(t);
        }
        self.update_word(t);
    }

    fn infer_segment(&mut self, t: f64) {
        let Some(index) = self.timeline.resolve(t, self.current) else {
            return;
        };

        if Some(index) == self.current {
            if self.pending_segment.is_some() {
                trace!("Pending segment change abandoned at {:.3}s", t);
                self.cancel_debounce();
            }
            return;
        }
        if Some(index) == self.pending_segment {
            return;
        }

        self.pending_segment = Some(index);
        let this = self.this.clone();
        let delay = self.config.debounce;
        self.timers.slot(TimerKind::Debounce).arm(|generation| {
            ScopedTimer::after("debounce", delay, async move {
                super::fire(&this, TimerKind::Debounce, generation, |inner| {
                    inner.commit_pending_segment();
                })
                .await;
            })
        });
    }

    fn commit_pending_segment(&mut self) {
        if let Some(index) = self.pending_segment.take() {
            if index < self.timeline.len() {
                self.set_current(index, false);
            }
        }
    }

    fn update_word(&mut self, t: f64) {
        let Some(segment_index) = self.current else {
            return;
        };
        let word = self
            .timeline
            .segment(segment_index)
            .and_then(|segment| resolve_word(&segment.words, t));
        if word != self.current_word {
            self.current_word = word;
            self.emit(EslEvent::WordChanged {
                segment_index,
                word_index: word,
                timestamp: time::now(),
            });
        }
    }

    pub(super) fn set_mode(&mut self, mode: PlaybackMode) {
        if mode == self.mode {
            return;
        }
        let previous = self.mode;
        let active = self.active_segment();
        self.cancel_segment_timers();
        self.mode = mode;
        debug!("Mode {} -> {}", previous, mode);
        self.emit(EslEvent::ModeChanged {
            mode,
            previous,
            timestamp: time::now(),
        });

        match mode {
            PlaybackMode::Repeat => {
                self.manual_selection = true;
                let Some(index) = active else {
                    return;
                };
                self.set_current(index, true);
                if self.player_running() {
                    self.arm_boundary_watch(index);
                }
            }
            PlaybackMode::Listen | PlaybackMode::Shadowing => {
                self.manual_selection = false;
                self.play_segment(active.unwrap_or(0));
            }
            PlaybackMode::Normal => {
                self.manual_selection = false;
                if previous.is_segment_driven() {
                    if let Some(player) = &self.player {
                        player.pause();
                    }
                    self.set_playing(false);
                }
            }
        }
    }

    /// Segment active right now: the pending change, else current, else the clock
    fn active_segment(&self) -> Option<usize> {
        self.pending_segment.or(self.current).or_else(|| {
            let t = self.player.as_ref()?.current_time();
            self.timeline.resolve(t, None)
        })
    }

    /// Move Listen/Shadowing to the segment a seek landed in
    ///
    /// Timers of the segment left behind are cancelled so its end can no
    /// longer pause playback. Repeat stays pinned; Normal infers through
    /// the debounce.
    pub(super) fn follow_seek(&mut self, t: f64) {
        if !t.is_finite() || !matches!(self.mode, PlaybackMode::Listen | PlaybackMode::Shadowing) {
            return;
        }
        let Some(index) = self.timeline.resolve(t, self.current) else {
            return;
        };
        if Some(index) == self.current {
            return;
        }

        debug!("Seek to {:.3}s left segment {:?} for {}", t, self.current, index);
        self.cancel_segment_timers();
        self.set_current(index, false);
        if self.player_running() {
            self.arm_boundary_watch(index);
        }
    }

    pub(super) fn go_to_segment(&mut self, index: usize, manual: bool, auto_play: bool) {
        let Some(window) = self.window(index) else {
            debug!("go_to_segment({}) out of range, ignored", index);
            return;
        };

        self.cancel_segment_timers();
        if manual {
            self.manual_selection = true;
        }
        self.set_current(index, manual);
        if let Some(player) = &self.player {
            player.seek(window.start);
        }

        if auto_play && self.mode != PlaybackMode::Normal {
            self.play_segment(index);
        } else if self.mode.is_segment_driven() && self.player_running() {
            // Already playing: keep the mode's boundary semantics for the new target
            self.arm_boundary_watch(index);
        }
    }

    pub(super) fn play_segment(&mut self, index: usize) {
        let Some(window) = self.window(index) else {
            debug!("play_segment({}) out of range, ignored", index);
            return;
        };
        let Some(player) = self.player.clone() else {
            debug!("play_segment({}) without a player, ignored", index);
            return;
        };

        self.cancel_segment_timers();
        let manual = self.manual_selection;
        self.set_current(index, manual);

        player.seek(window.start);
        player.play();
        self.set_playing(true);
        self.arm_boundary_watch(index);
    }

    pub(super) fn step(&mut self, forward: bool) {
        let target = match (self.current, forward) {
            (None, true) => 0,
            (None, false) => return,
            (Some(i), true) => i + 1,
            (Some(i), false) => match i.checked_sub(1) {
                Some(prev) => prev,
                None => return,
            },
        };

        if self.mode == PlaybackMode::Repeat {
            self.go_to_segment(target, true, true);
        } else {
            self.go_to_segment(target, false, false);
        }
    }

    pub(super) fn toggle_play_pause(&mut self) {
        let Some(player) = self.player.clone() else {
            return;
        };

        if !player.is_paused() {
            player.pause();
            self.cancel_watch();
            self.timers.slot(TimerKind::AutoAdvance).cancel();
            self.set_playing(false);
            return;
        }

        if self.mode == PlaybackMode::Normal {
            player.play();
            self.set_playing(true);
            return;
        }

        if self.in_shadowing_pause {
            // Skip the rest of the pause
            if let Some(index) = self.current {
                self.timers.slot(TimerKind::ShadowingResume).cancel();
                self.resume_shadowing(index);
                return;
            }
        }
        if self.mode == PlaybackMode::Listen && self.timers.slot(TimerKind::AutoAdvance).is_armed() {
            if let Some(index) = self.current {
                self.timers.slot(TimerKind::AutoAdvance).cancel();
                if index + 1 < self.timeline.len() {
                    self.go_to_segment(index + 1, false, true);
                    return;
                }
            }
        }

        let t = player.current_time();
        let Some(index) = self.current.or_else(|| self.timeline.resolve(t, None)) else {
            return;
        };
        let Some(window) = self.window(index) else {
            return;
        };
        self.set_current(index, self.manual_selection);

        // Restart when parked at/after the end or before the start, else resume in place
        if t >= window.end - self.config.repeat_restart_tolerance || t < window.start {
            player.seek(window.start);
        }
        player.play();
        self.set_playing(true);
        self.arm_boundary_watch(index);
    }
}

impl SegmentController {
    /// Feed one player clock tick
    ///
    /// Ticks may arrive out of order or unevenly spaced. Normally the
    /// attached player's events call this; it is public for players that
    /// report time some other way.
    pub async fn on_time_update(&self, t: f64) {
        self.apply(|inner| inner.on_time_update(t)).await;
    }

    /// Switch playback mode
    ///
    /// - Repeat: pin the active segment and mark it manual; no auto-play
    /// - Listen / Shadowing: clear the manual flag and play the active segment
    ///   (pending change, else current, else resolved from the player clock)
    /// - Normal: clear the manual flag; pause when leaving a segment mode
    pub async fn set_mode(&self, mode: PlaybackMode) {
        self.apply(|inner| inner.set_mode(mode)).await;
    }

    /// Jump to a segment's computed start
    ///
    /// Out-of-range indices are ignored. `manual` only ever sets the manual
    /// flag. Plays only when `auto_play` is set and the mode is not Normal.
    pub async fn go_to_segment(&self, index: usize, manual: bool, auto_play: bool) {
        self.apply(|inner| inner.go_to_segment(index, manual, auto_play))
            .await;
    }

    /// Play one segment from its computed start and pause at its computed end
    pub async fn play_segment(&self, index: usize) {
        self.apply(|inner| inner.play_segment(index)).await;
    }

    /// Previous segment (auto-plays in Repeat)
    pub async fn previous(&self) {
        self.apply(|inner| inner.step(false)).await;
    }

    /// Next segment (auto-plays in Repeat)
    pub async fn next(&self) {
        self.apply(|inner| inner.step(true)).await;
    }

    /// The play/pause user action of the current mode
    pub async fn toggle_play_pause(&self) {
        self.apply(ControllerInner::toggle_play_pause).await;
    }
}
