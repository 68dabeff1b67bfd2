//! Controller handle, state and lifecycle
//!
//! **Responsibilities:**
//! - `SegmentController` handle and its locked `ControllerInner` state
//! - Lifecycle (attach/detach player, segment reload, shutdown)
//! - Shared helpers: current-segment bookkeeping, event emission, snapshot
//!   publication, timer slots

use esl_common::transcript::sanitize_segments;
use esl_common::{time, EslEvent, PlaybackMode, Segment};
use futures::stream::Stream;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info};

use crate::config::ControllerConfig;
use crate::playback::timeline::SegmentTimeline;
use crate::playback::timer::TimerSlot;
use crate::playback::timing::SegmentWindow;
use crate::player::MediaPlayer;
use crate::state::{PlaybackSnapshot, SharedState};

/// Volume restored by unmute when the pre-mute volume was 0
pub(super) const UNMUTE_FALLBACK_VOLUME: f64 = 0.5;

/// Kinds of controller timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TimerKind {
    /// Segment change debounce
    Debounce,
    /// Boundary watch of the playing segment
    Watch,
    /// Listen-mode advance to the next segment
    AutoAdvance,
    /// End of a shadowing pause
    ShadowingResume,
    /// Player event subscription
    PlayerEvents,
}

/// One slot per timer kind
#[derive(Debug, Default)]
pub(super) struct Timers {
    debounce: TimerSlot,
    watch: TimerSlot,
    auto_advance: TimerSlot,
    shadowing_resume: TimerSlot,
    player_events: TimerSlot,
}

impl Timers {
    pub(super) fn slot(&mut self, kind: TimerKind) -> &mut TimerSlot {
        match kind {
            TimerKind::Debounce => &mut self.debounce,
            TimerKind::Watch => &mut self.watch,
            TimerKind::AutoAdvance => &mut self.auto_advance,
            TimerKind::ShadowingResume => &mut self.shadowing_resume,
            TimerKind::PlayerEvents => &mut self.player_events,
        }
    }

    fn cancel_all(&mut self) {
        self.debounce.cancel();
        self.watch.cancel();
        self.auto_advance.cancel();
        self.shadowing_resume.cancel();
        self.player_events.cancel();
    }
}

/// Controller state, only touched under the controller lock
pub(super) struct ControllerInner {
    /// Back-reference handed to timer tasks
    pub(super) this: Weak<Mutex<ControllerInner>>,
    pub(super) shared: Arc<SharedState>,
    pub(super) config: ControllerConfig,
    pub(super) timeline: SegmentTimeline,
    pub(super) player: Option<Arc<dyn MediaPlayer>>,

    pub(super) mode: PlaybackMode,
    pub(super) current: Option<usize>,
    pub(super) current_word: Option<usize>,
    pub(super) manual_selection: bool,
    pub(super) is_playing: bool,

    /// Segment waiting out the debounce
    pub(super) pending_segment: Option<usize>,
    /// Segment whose boundary watch is armed
    pub(super) watching: Option<usize>,

    pub(super) shadowing_delay: Duration,
    pub(super) in_shadowing_pause: bool,

    pub(super) muted: bool,
    pub(super) pre_mute_volume: f64,

    pub(super) disposed: bool,
    pub(super) timers: Timers,
}

impl ControllerInner {
    pub(super) fn emit(&self, event: EslEvent) {
        self.shared.broadcast_event(event);
    }

    pub(super) fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_segment: self.current,
            current_word: self.current_word,
            mode: self.mode,
            manual_selection: self.manual_selection,
            is_playing: self.is_playing,
            shadowing_delay_secs: self.shadowing_delay.as_secs_f64(),
            in_shadowing_pause: self.in_shadowing_pause,
            playback_rate: self.player.as_ref().map_or(1.0, |p| p.playback_rate()),
            volume: self.player.as_ref().map_or(1.0, |p| p.volume()),
            muted: self.muted,
            segment_count: self.timeline.len(),
        }
    }

    pub(super) fn publish(&self) {
        self.shared.publish_snapshot(self.snapshot());
    }

    /// Whether the attached player is running
    pub(super) fn player_running(&self) -> bool {
        self.player.as_ref().is_some_and(|p| !p.is_paused())
    }

    /// Move the highlight; emits `SegmentChanged` when it actually moves
    pub(super) fn set_current(&mut self, index: usize, manual: bool) {
        if self.current == Some(index) {
            return;
        }
        let previous = self.current.replace(index);
        self.current_word = None;
        debug!("Segment {:?} -> {} (manual: {})", previous, index, manual);
        self.emit(EslEvent::SegmentChanged {
            index,
            previous,
            manual,
            timestamp: time::now(),
        });
    }

    /// Record playing state; emits `PlaybackStateChanged` on change
    pub(super) fn set_playing(&mut self, playing: bool) {
        if self.is_playing == playing {
            return;
        }
        self.is_playing = playing;
        self.emit(EslEvent::PlaybackStateChanged {
            playing,
            timestamp: time::now(),
        });
    }

    /// Cancel the pending segment change
    pub(super) fn cancel_debounce(&mut self) {
        self.pending_segment = None;
        self.timers.slot(TimerKind::Debounce).cancel();
    }

    /// Cancel the boundary watch
    pub(super) fn cancel_watch(&mut self) {
        self.watching = None;
        self.timers.slot(TimerKind::Watch).cancel();
    }

    /// Cancel every wait tied to the current segment (not the player subscription)
    pub(super) fn cancel_segment_timers(&mut self) {
        self.cancel_debounce();
        self.cancel_watch();
        self.timers.slot(TimerKind::AutoAdvance).cancel();
        self.timers.slot(TimerKind::ShadowingResume).cancel();
        self.in_shadowing_pause = false;
    }

    pub(super) fn window(&self, index: usize) -> Option<SegmentWindow> {
        self.timeline.window(index)
    }

    fn load_segments(&mut self, segments: Vec<Segment>) {
        self.cancel_segment_timers();
        self.timeline = SegmentTimeline::new(sanitize_segments(segments), &self.config.timing);
        let count = self.timeline.len();
        if self.current.is_some_and(|i| i >= count) {
            self.current = None;
        }
        self.current_word = None;
        info!("Loaded {} segments", count);
        self.emit(EslEvent::SegmentsLoaded {
            count,
            timestamp: time::now(),
        });
    }

    fn attach_player(&mut self, player: Arc<dyn MediaPlayer>) {
        self.detach_player();
        let events = player.subscribe();
        self.is_playing = !player.is_paused();
        self.pre_mute_volume = player.volume();
        self.player = Some(player);
        self.spawn_player_events(events);
        info!("Media player attached");
    }

    fn detach_player(&mut self) {
        if self.player.take().is_none() {
            return;
        }
        self.timers.slot(TimerKind::PlayerEvents).cancel();
        self.cancel_segment_timers();
        self.set_playing(false);
        info!("Media player detached");
    }

    fn shutdown(&mut self) {
        self.timers.cancel_all();
        self.pending_segment = None;
        self.watching = None;
        self.in_shadowing_pause = false;
        self.player = None;
        self.disposed = true;
        info!("Segment controller shut down");
    }
}

/// Segment playback controller
///
/// Cloneable handle; all clones drive the same controller. Dropping the
/// last handle (or calling [`shutdown`](Self::shutdown)) aborts every
/// pending timer.
///
/// # Examples
/// ```no_run
/// use esl_common::{PlaybackMode, Segment};
/// use esl_player::{ControllerConfig, SegmentController, SimulatedPlayer};
///
/// # async fn demo() {
/// let controller = SegmentController::new(
///     vec![Segment::new(0, 0.0, 2.5, "Hello."), Segment::new(1, 3.0, 5.0, "How are you?")],
///     ControllerConfig::default(),
/// );
/// controller.attach_player(SimulatedPlayer::new(10.0)).await;
/// controller.set_mode(PlaybackMode::Listen).await;
/// # }
/// ```
#[derive(Clone)]
pub struct SegmentController {
    pub(super) inner: Arc<Mutex<ControllerInner>>,
    shared: Arc<SharedState>,
}

impl SegmentController {
    /// Create a controller over `segments` with no player attached
    ///
    /// Segments are sorted by start and reindexed; invalid ones (non-finite
    /// or `start >= end`) are dropped with a warning.
    pub fn new(segments: Vec<Segment>, config: ControllerConfig) -> Self {
        let shared = Arc::new(SharedState::new());
        let timeline = SegmentTimeline::new(sanitize_segments(segments), &config.timing);
        let shadowing_delay = config.clamp_shadowing_delay(config.shadowing_delay);

        let inner = Arc::new_cyclic(|this| {
            Mutex::new(ControllerInner {
                this: this.clone(),
                shared: Arc::clone(&shared),
                config,
                timeline,
                player: None,
                mode: PlaybackMode::Normal,
                current: None,
                current_word: None,
                manual_selection: false,
                is_playing: false,
                pending_segment: None,
                watching: None,
                shadowing_delay,
                in_shadowing_pause: false,
                muted: false,
                pre_mute_volume: 1.0,
                disposed: false,
                timers: Timers::default(),
            })
        });

        let controller = Self { inner, shared };
        if let Ok(inner) = controller.inner.try_lock() {
            inner.publish();
        }
        controller
    }

    /// Run `op` under the lock, then publish the snapshot; no-op after shutdown
    pub(super) async fn apply(&self, op: impl FnOnce(&mut ControllerInner)) {
        let mut inner = self.inner.lock().await;
        if inner.disposed {
            return;
        }
        op(&mut inner);
        inner.publish();
    }

    async fn read<R>(&self, f: impl FnOnce(&ControllerInner) -> R) -> R {
        let inner = self.inner.lock().await;
        f(&inner)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Drive the controller from `player`, replacing any attached player
    pub async fn attach_player(&self, player: Arc<dyn MediaPlayer>) {
        self.apply(|inner| inner.attach_player(player)).await;
    }

    /// Stop listening to the attached player and cancel its timers
    pub async fn detach_player(&self) {
        self.apply(ControllerInner::detach_player).await;
    }

    /// Replace the segment set wholesale, sanitized as in [`new`](Self::new)
    ///
    /// Cancels all segment timers. The current index survives only if it is
    /// still in range.
    pub async fn load_segments(&self, segments: Vec<Segment>) {
        self.apply(|inner| inner.load_segments(segments)).await;
    }

    /// Cancel everything; later calls are no-ops
    ///
    /// The player is left as it is.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.disposed {
            inner.shutdown();
        }
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.snapshot()
    }

    /// Watch published snapshots
    pub fn watch_snapshot(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.shared.watch_snapshot()
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<EslEvent> {
        self.shared.subscribe_events()
    }

    /// Controller events as a stream
    pub fn event_stream(&self) -> impl Stream<Item = EslEvent> {
        self.shared.event_stream()
    }

    pub async fn current_segment(&self) -> Option<usize> {
        self.read(|inner| inner.current).await
    }

    pub async fn mode(&self) -> PlaybackMode {
        self.read(|inner| inner.mode).await
    }

    pub async fn is_manual_selection(&self) -> bool {
        self.read(|inner| inner.manual_selection).await
    }

    pub async fn is_playing(&self) -> bool {
        self.read(|inner| inner.is_playing).await
    }

    pub async fn shadowing_delay(&self) -> Duration {
        self.read(|inner| inner.shadowing_delay).await
    }

    pub async fn segment_count(&self) -> usize {
        self.read(|inner| inner.timeline.len()).await
    }

    /// Computed playback window of a segment
    pub async fn segment_window(&self, index: usize) -> Option<SegmentWindow> {
        self.read(|inner| inner.window(index)).await
    }

    /// Whether the boundary watch is armed, and for which segment
    pub async fn watched_segment(&self) -> Option<usize> {
        self.read(|inner| inner.watching).await
    }
}
