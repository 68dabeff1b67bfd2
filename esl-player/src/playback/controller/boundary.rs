//! Boundary watch, segment completion and player events
//!
//! **Responsibilities:**
//! - Boundary watch: busy-poll the player clock until the computed end
//! - Completion follow-ups (Listen auto-advance, Shadowing pause/resume)
//! - Player event pump (time updates, seeks, play/pause, ended)
//!
//! The watch polls instead of waiting for a player "boundary crossed"
//! event: media backends do not report time finely enough. The cost is up
//! to one poll interval of overshoot, which the snap to the computed end
//! undoes.

use esl_common::config::ShadowingContinuation;
use esl_common::{time, EslEvent, PlaybackMode};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, trace, warn};

use super::core::{ControllerInner, TimerKind};
use crate::playback::timer::ScopedTimer;
use crate::playback::timing::SegmentWindow;
use crate::player::PlayerEvent;

impl ControllerInner {
    /// Arm (or re-arm) the boundary watch for `index`
    pub(super) fn arm_boundary_watch(&mut self, index: usize) {
        let Some(window) = self.window(index) else {
            return;
        };
        let this = self.this.clone();
        let delay = self.config.boundary_watch_delay;
        let period = self.config.boundary_poll_interval;

        self.watching = Some(index);
        self.timers.slot(TimerKind::Watch).arm(|generation| {
            ScopedTimer::after("boundary_watch", delay, async move {
                let mut ticker = tokio::time::interval(period);
                loop {
                    ticker.tick().await;
                    let Some(shared) = this.upgrade() else {
                        return;
                    };
                    let mut inner = shared.lock().await;
                    if inner.disposed || !inner.timers.slot(TimerKind::Watch).is_current(generation) {
                        return;
                    }
                    if inner.poll_boundary(index, window, generation) {
                        inner.publish();
                        return;
                    }
                }
            })
        });
        trace!("Boundary watch armed for segment {} (end {:.3}s)", index, window.end);
    }

    /// One watch tick; true when the watch is done
    fn poll_boundary(&mut self, index: usize, window: SegmentWindow, generation: u64) -> bool {
        let Some(player) = self.player.clone() else {
            self.timers.slot(TimerKind::Watch).release(generation);
            self.watching = None;
            return true;
        };

        let t = player.current_time();
        if t >= window.end {
            self.timers.slot(TimerKind::Watch).release(generation);
            self.complete_segment(index, true);
            return true;
        }

        // User dragged back before the pinned segment: snap to its start
        if self.mode == PlaybackMode::Repeat
            && !player.is_paused()
            && t < window.start - self.config.repeat_restart_tolerance
        {
            debug!("Repeat guard: {:.3}s before segment {} start, snapping", t, index);
            player.seek(window.start);
        }
        false
    }

    /// Segment `index` finished playing
    ///
    /// `snap` moves the player exactly onto the computed end so the next
    /// resume cannot drift past it.
    fn complete_segment(&mut self, index: usize, snap: bool) {
        self.watching = None;
        if let Some(player) = self.player.clone() {
            player.pause();
            if snap {
                if let Some(window) = self.window(index) {
                    player.seek(window.end);
                }
            }
        }
        self.set_playing(false);
        debug!("Segment {} complete", index);
        self.emit(EslEvent::SegmentCompleted {
            index,
            timestamp: time::now(),
        });

        match self.mode {
            PlaybackMode::Listen => self.schedule_auto_advance(index),
            PlaybackMode::Shadowing => self.start_shadowing_pause(index),
            PlaybackMode::Normal | PlaybackMode::Repeat => {}
        }
    }

    fn schedule_auto_advance(&mut self, index: usize) {
        let next = index + 1;
        if next >= self.timeline.len() {
            debug!("Listen: last segment {} done, stopping", index);
            return;
        }
        let this = self.this.clone();
        let delay = self.config.listen_advance_delay;
        self.timers.slot(TimerKind::AutoAdvance).arm(|generation| {
            ScopedTimer::after("auto_advance", delay, async move {
                super::fire(&this, TimerKind::AutoAdvance, generation, move |inner| {
                    if inner.mode == PlaybackMode::Listen {
                        inner.go_to_segment(next, false, true);
                    }
                })
                .await;
            })
        });
    }

    fn start_shadowing_pause(&mut self, index: usize) {
        let delay = self.shadowing_delay;
        self.in_shadowing_pause = true;
        self.emit(EslEvent::ShadowingPauseStarted {
            index,
            delay_ms: delay.as_millis() as u64,
            timestamp: time::now(),
        });

        let this = self.this.clone();
        self.timers.slot(TimerKind::ShadowingResume).arm(|generation| {
            ScopedTimer::after("shadowing_resume", delay, async move {
                super::fire(&this, TimerKind::ShadowingResume, generation, move |inner| {
                    inner.resume_shadowing(index);
                })
                .await;
            })
        });
    }

    /// End the shadowing pause that followed segment `index`
    pub(super) fn resume_shadowing(&mut self, index: usize) {
        self.in_shadowing_pause = false;
        if self.mode != PlaybackMode::Shadowing {
            return;
        }
        let target = match self.config.shadowing_continuation {
            ShadowingContinuation::Advance => index + 1,
            ShadowingContinuation::Replay => index,
        };
        if target >= self.timeline.len() {
            debug!("Shadowing: last segment {} done, stopping", index);
            return;
        }
        self.emit(EslEvent::ShadowingResumed {
            index: target,
            timestamp: time::now(),
        });
        self.play_segment(target);
    }

    // ========================================================================
    // Player events
    // ========================================================================

    pub(super) fn spawn_player_events(&mut self, mut events: broadcast::Receiver<PlayerEvent>) {
        let this = self.this.clone();
        self.timers.slot(TimerKind::PlayerEvents).arm(|generation| {
            ScopedTimer::spawn("player_events", async move {
                loop {
                    let event = match events.recv().await {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Player event subscription lagged, {} events skipped", skipped);
                            continue;
                        }
                        Err(RecvError::Closed) => {
                            debug!("Player event channel closed");
                            return;
                        }
                    };

                    let Some(shared) = this.upgrade() else {
                        return;
                    };
                    let mut inner = shared.lock().await;
                    if inner.disposed
                        || !inner.timers.slot(TimerKind::PlayerEvents).is_current(generation)
                    {
                        return;
                    }
                    inner.handle_player_event(event);
                    inner.publish();
                }
            })
        });
    }

    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::TimeUpdate(t) => self.on_time_update(t),
            PlayerEvent::Seeked(t) => {
                // The event may trail later seeks; follow where the player is now
                if let Some(now) = self.player.as_ref().map(|p| p.current_time()) {
                    self.follow_seek(now);
                }
                self.on_time_update(t);
            }
            PlayerEvent::Play | PlayerEvent::Pause => {
                // Events may trail several transitions; trust the player's state
                let running = self.player_running();
                if running && self.mode != PlaybackMode::Repeat {
                    self.manual_selection = false;
                }
                self.set_playing(running);
            }
            PlayerEvent::Ended => self.on_ended(),
        }
    }

    fn on_ended(&mut self) {
        self.set_playing(false);
        // A watch whose end lies past the media end never fires on its own
        if let Some(index) = self.watching {
            self.timers.slot(TimerKind::Watch).cancel();
            self.complete_segment(index, false);
        }
    }
}
