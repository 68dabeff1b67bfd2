//! Segment timeline and clock-to-segment resolution
//!
//! Holds the immutable segment set of a playback session together with each
//! segment's computed window, and answers "which segment is active at time
//! `t`".
//!
//! **Resolution order:**
//! 1. The currently active segment, if its window still contains `t`
//!    (O(1) hot path while playback advances linearly; also keeps the
//!    highlight stable where adjacent buffered windows overlap)
//! 2. The first segment whose window contains `t`
//! 3. Gap attribution: the segment whose window start is `<= t` and the
//!    next segment's window start is `> t` (time between two segments
//!    belongs to the earlier one); the last segment for any `t` past its
//!    start, which covers `t` beyond the final end
//! 4. Otherwise `t` precedes every segment: keep the previous index, and
//!    only fall back to the first segment when there is none

use esl_common::Segment;

use super::timing::{compute_window, SegmentWindow};
use crate::config::TimingConfig;

/// Ordered segments with precomputed playback windows
#[derive(Debug, Clone, Default)]
pub struct SegmentTimeline {
    segments: Vec<Segment>,
    windows: Vec<SegmentWindow>,
}

impl SegmentTimeline {
    /// Build a timeline; segments are expected sorted by start
    pub fn new(segments: Vec<Segment>, timing: &TimingConfig) -> Self {
        let windows = segments.iter().map(|s| compute_window(s, timing)).collect();
        Self { segments, windows }
    }

    /// Resolve the active segment at `t`
    ///
    /// # Arguments
    /// * `t` - Player time in seconds
    /// * `current` - Currently active segment, if any
    ///
    /// # Returns
    /// Index of the active segment, or None only for an empty timeline
    ///
    /// # Examples
    /// ```
    /// use esl_common::Segment;
    /// use esl_player::config::TimingConfig;
    /// use esl_player::playback::timeline::SegmentTimeline;
    ///
    /// let timeline = SegmentTimeline::new(
    ///     vec![Segment::new(0, 1.0, 4.0, "a"), Segment::new(1, 6.0, 9.0, "b")],
    ///     &TimingConfig::default(),
    /// );
    ///
    /// assert_eq!(timeline.resolve(2.0, None), Some(0));
    /// // Gap between segments belongs to the earlier one
    /// assert_eq!(timeline.resolve(5.0, None), Some(0));
    /// // Past the end stays on the last segment
    /// assert_eq!(timeline.resolve(60.0, Some(0)), Some(1));
    /// // Before the first segment keeps the previous index
    /// assert_eq!(timeline.resolve(0.1, Some(1)), Some(1));
    /// ```
    pub fn resolve(&self, t: f64, current: Option<usize>) -> Option<usize> {
        if self.windows.is_empty() {
            return None;
        }

        // HOT PATH: still inside the active window
        if let Some(idx) = current {
            if self.windows.get(idx).is_some_and(|w| w.contains(t)) {
                return Some(idx);
            }
        }

        // COLD PATH: exact containment, then gap attribution
        if let Some(idx) = self.windows.iter().position(|w| w.contains(t)) {
            return Some(idx);
        }

        let last = self.windows.len() - 1;
        let preceding = self.windows.iter().enumerate().position(|(i, w)| {
            t >= w.start && (i == last || t < self.windows[i + 1].start)
        });
        if preceding.is_some() {
            return preceding;
        }

        if t > self.windows[last].end {
            return Some(last);
        }

        // Before the first segment: never jump back to 0 over a known index
        match current {
            Some(idx) if idx <= last => Some(idx),
            _ => Some(0),
        }
    }

    /// Segment by index
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Computed window by index
    pub fn window(&self, index: usize) -> Option<SegmentWindow> {
        self.windows.get(index).copied()
    }

    /// All segments
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Get number of segments in timeline
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if timeline is empty
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
