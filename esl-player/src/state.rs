//! Published controller state
//!
//! The controller publishes two things to UI layers:
//! - discrete [`EslEvent`]s on a broadcast channel (lossy for slow readers)
//! - the latest [`PlaybackSnapshot`] on a watch channel (always current)
//!
//! Renderers are expected to be stateless over the snapshot.

use esl_common::{EslEvent, PlaybackMode};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

/// Event buffer size per subscriber
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Snapshot of controller playback state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    /// Highlighted segment (None until one can be resolved)
    pub current_segment: Option<usize>,
    /// Active word within the current segment
    pub current_word: Option<usize>,
    pub mode: PlaybackMode,
    /// Current segment was picked explicitly, not inferred from the clock
    pub manual_selection: bool,
    pub is_playing: bool,
    /// Shadowing pause length in seconds
    pub shadowing_delay_secs: f64,
    /// Waiting out a shadowing pause
    pub in_shadowing_pause: bool,
    pub playback_rate: f64,
    pub volume: f64,
    pub muted: bool,
    /// Number of loaded segments
    pub segment_count: usize,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            current_segment: None,
            current_word: None,
            mode: PlaybackMode::Normal,
            manual_selection: false,
            is_playing: false,
            shadowing_delay_secs: 2.0,
            in_shadowing_pause: false,
            playback_rate: 1.0,
            volume: 1.0,
            muted: false,
            segment_count: 0,
        }
    }
}

/// Shared publication channels
pub struct SharedState {
    event_tx: broadcast::Sender<EslEvent>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (snapshot_tx, _) = watch::channel(PlaybackSnapshot::default());
        Self {
            event_tx,
            snapshot_tx,
        }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast_event(&self, event: EslEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event channel
    pub fn subscribe_events(&self) -> broadcast::Receiver<EslEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe as a stream; lagged gaps are logged and skipped
    pub fn event_stream(&self) -> impl Stream<Item = EslEvent> {
        BroadcastStream::new(self.event_tx.subscribe()).filter_map(|result| async move {
            match result {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Event subscriber lagged: {:?}", e);
                    None
                }
            }
        })
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Watch snapshot changes
    pub fn watch_snapshot(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Publish a snapshot; watchers are only woken when it changed
    pub fn publish_snapshot(&self, snapshot: PlaybackSnapshot) {
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
