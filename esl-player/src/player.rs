//! Media player capability interface
//!
//! The controller never owns a player's lifecycle; it is handed an
//! `Arc<dyn MediaPlayer>` and mutates it only through this trait. Browser
//! media elements, native decoders and the in-process [`SimulatedPlayer`]
//! all fit behind it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Events a player publishes to subscribers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    /// Clock tick (frequency is player-defined and not guaranteed periodic)
    TimeUpdate(f64),
    /// Position jumped (user scrub or programmatic seek)
    Seeked(f64),
    /// Playback started
    Play,
    /// Playback paused
    Pause,
    /// Playback reached the end of the media
    Ended,
}

/// Opaque capability set of an external media player
///
/// Times are media seconds. Implementations use interior mutability; the
/// controller calls these from timer tasks as well as user operations.
pub trait MediaPlayer: Send + Sync {
    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Jump to a position in seconds
    fn seek(&self, seconds: f64);

    /// Start or resume playback
    fn play(&self);

    /// Pause playback
    fn pause(&self);

    /// Whether playback is paused
    fn is_paused(&self) -> bool;

    /// Media duration in seconds
    fn duration(&self) -> f64;

    /// Current playback rate (1.0 = normal speed)
    fn playback_rate(&self) -> f64;

    /// Set playback rate
    fn set_playback_rate(&self, rate: f64);

    /// Current volume (0.0-1.0)
    fn volume(&self) -> f64;

    /// Set volume (0.0-1.0)
    fn set_volume(&self, volume: f64);

    /// Subscribe to player events
    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent>;
}

#[derive(Debug)]
struct SimState {
    /// Position at the last anchor point
    position: f64,
    /// When playback (re)started from `position`; None while paused
    playing_since: Option<Instant>,
    rate: f64,
    volume: f64,
    duration: f64,
}

/// In-process media player driven by the tokio clock
///
/// Position advances with `tokio::time::Instant`, so tests running on a
/// paused runtime move it with `tokio::time::advance`. Reaching the
/// duration stops playback and publishes `Ended`.
pub struct SimulatedPlayer {
    state: Mutex<SimState>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl SimulatedPlayer {
    /// Create a paused player at position 0
    pub fn new(duration: f64) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);
        Arc::new(Self {
            state: Mutex::new(SimState {
                position: 0.0,
                playing_since: None,
                rate: 1.0,
                volume: 1.0,
                duration: duration.max(0.0),
            }),
            event_tx,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlayerEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Fold elapsed play time into `position`; true if the end was reached
    fn settle(state: &mut SimState) -> bool {
        let Some(since) = state.playing_since else {
            return false;
        };
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(since).as_secs_f64();
        state.position = (state.position + elapsed * state.rate).min(state.duration);
        if state.position >= state.duration {
            state.playing_since = None;
            true
        } else {
            state.playing_since = Some(now);
            false
        }
    }

    /// Settle under the lock, then publish `Ended` outside it
    fn settled(&self) -> MutexGuard<'_, SimState> {
        let mut state = self.lock();
        if Self::settle(&mut state) {
            drop(state);
            debug!("Simulated player reached end of media");
            self.emit(PlayerEvent::Ended);
            state = self.lock();
        }
        state
    }

    /// Publish `TimeUpdate` every `period` while playing
    ///
    /// The task stops when the player is dropped; abort the handle to stop
    /// it earlier.
    pub fn spawn_clock(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(player) = weak.upgrade() else {
                    return;
                };
                if !player.is_paused() {
                    let t = player.current_time();
                    trace!("Simulated clock tick at {:.3}s", t);
                    player.emit(PlayerEvent::TimeUpdate(t));
                }
            }
        })
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn current_time(&self) -> f64 {
        self.settled().position
    }

    fn seek(&self, seconds: f64) {
        let target = {
            let mut state = self.settled();
            let target = if seconds.is_finite() {
                seconds.clamp(0.0, state.duration)
            } else {
                0.0
            };
            state.position = target;
            if state.playing_since.is_some() {
                state.playing_since = Some(Instant::now());
            }
            target
        };
        self.emit(PlayerEvent::Seeked(target));
    }

    fn play(&self) {
        {
            let mut state = self.settled();
            if state.playing_since.is_some() {
                return;
            }
            if state.position >= state.duration {
                // Media elements restart from the top when played at the end
                state.position = 0.0;
            }
            state.playing_since = Some(Instant::now());
        }
        self.emit(PlayerEvent::Play);
    }

    fn pause(&self) {
        {
            let mut state = self.settled();
            if state.playing_since.is_none() {
                return;
            }
            state.playing_since = None;
        }
        self.emit(PlayerEvent::Pause);
    }

    fn is_paused(&self) -> bool {
        self.settled().playing_since.is_none()
    }

    fn duration(&self) -> f64 {
        self.lock().duration
    }

    fn playback_rate(&self) -> f64 {
        self.lock().rate
    }

    fn set_playback_rate(&self, rate: f64) {
        let mut state = self.settled();
        if rate.is_finite() && rate > 0.0 {
            state.rate = rate;
        }
    }

    fn volume(&self) -> f64 {
        self.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        if volume.is_finite() {
            self.lock().volume = volume.clamp(0.0, 1.0);
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_only_while_playing() {
        let player = SimulatedPlayer::new(60.0);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_close(player.current_time(), 0.0);

        player.play();
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_close(player.current_time(), 1.5);

        player.pause();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_close(player.current_time(), 1.5);
        assert!(player.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_scales_clock() {
        let player = SimulatedPlayer::new(60.0);
        player.set_playback_rate(2.0);
        player.play();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_close(player.current_time(), 2.0);
        assert_eq!(player.playback_rate(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_clamps_and_emits() {
        let player = SimulatedPlayer::new(10.0);
        let mut rx = player.subscribe();

        player.seek(25.0);
        assert_close(player.current_time(), 10.0);
        assert_eq!(rx.recv().await.unwrap(), PlayerEvent::Seeked(10.0));

        player.seek(-3.0);
        assert_close(player.current_time(), 0.0);
        assert_eq!(rx.recv().await.unwrap(), PlayerEvent::Seeked(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaching_end_emits_ended_once() {
        let player = SimulatedPlayer::new(2.0);
        let mut rx = player.subscribe();

        player.play();
        assert_eq!(rx.recv().await.unwrap(), PlayerEvent::Play);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(player.is_paused());
        assert_close(player.current_time(), 2.0);
        assert_eq!(rx.recv().await.unwrap(), PlayerEvent::Ended);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_and_pause_are_idempotent() {
        let player = SimulatedPlayer::new(10.0);
        let mut rx = player.subscribe();

        player.play();
        player.play();
        player.pause();
        player.pause();

        assert_eq!(rx.recv().await.unwrap(), PlayerEvent::Play);
        assert_eq!(rx.recv().await.unwrap(), PlayerEvent::Pause);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_task_publishes_time_updates() {
        let player = SimulatedPlayer::new(10.0);
        let mut rx = player.subscribe();
        let clock = player.spawn_clock(Duration::from_millis(250));

        player.play();
        assert_eq!(rx.recv().await.unwrap(), PlayerEvent::Play);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PlayerEvent::TimeUpdate(_)));

        clock.abort();
    }

    #[test]
    fn test_volume_clamped() {
        let player = SimulatedPlayer::new(10.0);
        player.set_volume(1.7);
        assert_eq!(player.volume(), 1.0);
        player.set_volume(-1.0);
        assert_eq!(player.volume(), 0.0);
    }
}
