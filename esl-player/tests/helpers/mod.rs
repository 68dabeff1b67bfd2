//! Test helpers for esl-player integration tests
//!
//! - `SegmentBuilder`: build segment lists with optional word timing
//! - `Fixture`: controller + simulated player wired together
//! - event draining and float assertions

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use esl_common::{EslEvent, Segment, Word};
use esl_player::{ControllerConfig, MediaPlayer, SegmentController, SimulatedPlayer};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Builder for segment lists
#[derive(Default)]
pub struct SegmentBuilder {
    segments: Vec<Segment>,
}

impl SegmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a segment without word timing
    pub fn segment(mut self, start: f64, end: f64) -> Self {
        let index = self.segments.len();
        self.segments
            .push(Segment::new(index, start, end, format!("Segment number {index}.")));
        self
    }

    /// Add a segment with word timing
    pub fn segment_with_words(mut self, start: f64, end: f64, words: &[(&str, f64, f64)]) -> Self {
        let index = self.segments.len();
        let words = words
            .iter()
            .map(|&(text, s, e)| Word::new(text, s, e))
            .collect::<Vec<_>>();
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        self.segments
            .push(Segment::new(index, start, end, text).with_words(words));
        self
    }

    pub fn build(self) -> Vec<Segment> {
        self.segments
    }
}

/// Four evenly spaced segments without word timing
///
/// Computed windows with default buffers:
/// `[0.85, 3.3]`, `[3.85, 6.3]`, `[6.85, 9.3]`, `[9.85, 12.3]`.
pub fn standard_segments() -> Vec<Segment> {
    SegmentBuilder::new()
        .segment(1.0, 3.0)
        .segment(4.0, 6.0)
        .segment(7.0, 9.0)
        .segment(10.0, 12.0)
        .build()
}

/// Controller, attached simulated player and an event subscription
pub struct Fixture {
    pub controller: SegmentController,
    pub player: Arc<SimulatedPlayer>,
    pub events: broadcast::Receiver<EslEvent>,
}

impl Fixture {
    pub async fn new(segments: Vec<Segment>, media_duration: f64) -> Self {
        Self::with_config(segments, media_duration, ControllerConfig::default()).await
    }

    pub async fn with_config(
        segments: Vec<Segment>,
        media_duration: f64,
        config: ControllerConfig,
    ) -> Self {
        let controller = SegmentController::new(segments, config);
        let player = SimulatedPlayer::new(media_duration);
        controller.attach_player(player.clone()).await;
        let events = controller.subscribe();
        Self {
            controller,
            player,
            events,
        }
    }

    /// Standard segments over 20 s of media
    pub async fn standard() -> Self {
        Self::new(standard_segments(), 20.0).await
    }

    /// Everything published since the last drain
    pub fn drain(&mut self) -> Vec<EslEvent> {
        drain(&mut self.events)
    }

    pub fn position(&self) -> f64 {
        self.player.current_time()
    }

    pub fn player_paused(&self) -> bool {
        self.player.is_paused()
    }
}

/// Collect pending events without waiting
pub fn drain(rx: &mut broadcast::Receiver<EslEvent>) -> Vec<EslEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return events,
        }
    }
}

/// Indices of `SegmentCompleted` events
pub fn completions(events: &[EslEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            EslEvent::SegmentCompleted { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

/// `(index, manual)` of `SegmentChanged` events
pub fn segment_changes(events: &[EslEvent]) -> Vec<(usize, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            EslEvent::SegmentChanged { index, manual, .. } => Some((*index, *manual)),
            _ => None,
        })
        .collect()
}

/// Let virtual time pass (tests run on a paused clock)
pub async fn wait_ms(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
