//! Computed segment timing
//!
//! Transcription timestamps tend to clip the first and last syllables of a
//! cue, so segment playback runs over a buffered window instead of the raw
//! bounds:
//!
//! - **Start:** first timed word start (raw start without word timing)
//!   minus the lead buffer, clamped at 0.
//! - **End, no word timing:** raw end plus the trail buffer.
//! - **End, with word timing:** let `gap = segment.end - last_word.end`.
//!   - `gap > distrust_gap`: word timing is likely wrong; raw end plus the
//!     minimum trail buffer.
//!   - `moderate_gap < gap <= distrust_gap`: the later of the word-based
//!     and segment-based ends.
//!   - otherwise: last word end plus the trail buffer.
//!
//!   The end is never earlier than raw end plus the minimum trail buffer.

use esl_common::Segment;

use crate::config::TimingConfig;

/// Playable window of a segment in media seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    pub start: f64,
    pub end: f64,
}

impl SegmentWindow {
    /// Inclusive containment
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Compute the playable window of a segment
pub fn compute_window(segment: &Segment, config: &TimingConfig) -> SegmentWindow {
    let segment_based_end = segment.end + config.min_trail_buffer;

    let mut timed = segment.words.iter().filter_map(|w| w.timing());
    let Some((first_start, first_end)) = timed.next() else {
        return SegmentWindow {
            start: (segment.start - config.lead_buffer).max(0.0),
            end: segment.end + config.trail_buffer,
        };
    };
    let last_end = timed.last().map(|(_, end)| end).unwrap_or(first_end);

    let word_based_end = last_end + config.trail_buffer;
    let gap = segment.end - last_end;
    let end = if gap > config.distrust_gap {
        segment_based_end
    } else if gap > config.moderate_gap {
        word_based_end.max(segment_based_end)
    } else {
        word_based_end
    };

    SegmentWindow {
        start: (first_start - config.lead_buffer).max(0.0),
        end: end.max(segment_based_end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esl_common::Word;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn words(spans: &[(f64, f64)]) -> Vec<Word> {
        spans
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| Word::new(format!("w{i}"), s, e))
            .collect()
    }

    #[test]
    fn test_no_words_uses_raw_bounds_with_buffers() {
        let segment = Segment::new(0, 2.0, 5.0, "plain");
        let window = compute_window(&segment, &TimingConfig::default());
        assert_close(window.start, 1.85);
        assert_close(window.end, 5.3);
    }

    #[test]
    fn test_start_clamped_at_zero() {
        let segment = Segment::new(0, 0.05, 1.0, "early");
        let window = compute_window(&segment, &TimingConfig::default());
        assert_close(window.start, 0.0);
    }

    #[test]
    fn test_moderate_gap_takes_later_end() {
        // [2.0, 5.0] with words spanning [2.1, 4.8]: gap 0.2
        let segment =
            Segment::new(0, 2.0, 5.0, "moderate").with_words(words(&[(2.1, 3.0), (3.2, 4.8)]));
        let window = compute_window(&segment, &TimingConfig::default());
        assert_close(window.start, 1.95);
        assert_close(window.end, 5.15);
    }

    #[test]
    fn test_small_gap_word_end_wins() {
        // gap 0.05 → 4.95 + 0.3
        let segment = Segment::new(0, 2.0, 5.0, "tight").with_words(words(&[(2.0, 4.95)]));
        let window = compute_window(&segment, &TimingConfig::default());
        assert_close(window.start, 1.85);
        assert_close(window.end, 5.25);
    }

    #[test]
    fn test_large_gap_distrusts_words() {
        // gap 1.0 → 5.0 + 0.15
        let segment = Segment::new(0, 2.0, 5.0, "loose").with_words(words(&[(2.5, 4.0)]));
        let window = compute_window(&segment, &TimingConfig::default());
        assert_close(window.start, 2.35);
        assert_close(window.end, 5.15);
    }

    #[test]
    fn test_words_past_segment_end() {
        // Negative gap: word end wins
        let segment = Segment::new(0, 2.0, 5.0, "overrun").with_words(words(&[(2.2, 5.4)]));
        let window = compute_window(&segment, &TimingConfig::default());
        assert_close(window.end, 5.7);
    }

    #[test]
    fn test_untimed_words_fall_back_to_segment_timing() {
        let untimed = vec![Word {
            text: "1999".to_string(),
            start: None,
            end: None,
            score: None,
        }];
        let segment = Segment::new(0, 2.0, 5.0, "numbers").with_words(untimed);
        let window = compute_window(&segment, &TimingConfig::default());
        assert_close(window.start, 1.85);
        assert_close(window.end, 5.3);
    }

    #[test]
    fn test_untimed_words_are_skipped_at_edges() {
        let mut spans = words(&[(2.3, 3.0), (3.5, 4.9)]);
        spans.insert(
            0,
            Word {
                text: "uh".to_string(),
                start: None,
                end: Some(2.1),
                score: None,
            },
        );
        let segment = Segment::new(0, 2.0, 5.0, "mixed").with_words(spans);
        let window = compute_window(&segment, &TimingConfig::default());
        assert_close(window.start, 2.15);
        assert_close(window.end, 5.2);
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = SegmentWindow { start: 1.0, end: 2.0 };
        assert!(window.contains(1.0));
        assert!(window.contains(2.0));
        assert!(!window.contains(2.0001));
    }
}
