//! Active word resolution for karaoke-style highlighting

use esl_common::Word;

/// Maximum distance to a word start for the closest-word fallback (seconds)
pub const WORD_SNAP_SECS: f64 = 2.0;

/// Resolve the word active at `t`
///
/// Returns an index into `words`. Untimed words are never selected.
///
/// Order: a word whose `[start, end]` contains `t`; then the word that has
/// started while the next timed word has not; then the timed word whose
/// start is closest to `t`, if within [`WORD_SNAP_SECS`].
pub fn resolve_word(words: &[Word], t: f64) -> Option<usize> {
    let timed: Vec<(usize, f64, f64)> = words
        .iter()
        .enumerate()
        .filter_map(|(i, w)| w.timing().map(|(s, e)| (i, s, e)))
        .collect();

    if let Some(&(i, _, _)) = timed.iter().find(|&&(_, s, e)| t >= s && t <= e) {
        return Some(i);
    }

    let mut closest: Option<(usize, f64)> = None;
    for (pos, &(i, start, _)) in timed.iter().enumerate() {
        if t >= start && timed.get(pos + 1).map_or(true, |&(_, next, _)| t < next) {
            return Some(i);
        }
        let distance = (t - start).abs();
        if closest.map_or(true, |(_, best)| distance < best) {
            closest = Some((i, distance));
        }
    }

    closest
        .filter(|&(_, distance)| distance <= WORD_SNAP_SECS)
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<Word> {
        vec![
            Word::new("How", 10.0, 10.3),
            Word::new("are", 10.4, 10.6),
            Word::new("you", 11.0, 11.4),
        ]
    }

    #[test]
    fn test_exact_containment() {
        assert_eq!(resolve_word(&words(), 10.5), Some(1));
        assert_eq!(resolve_word(&words(), 11.4), Some(2));
    }

    #[test]
    fn test_between_words_holds_previous() {
        assert_eq!(resolve_word(&words(), 10.8), Some(1));
        // After the last word ends
        assert_eq!(resolve_word(&words(), 20.0), Some(2));
    }

    #[test]
    fn test_before_first_word_snaps_within_limit() {
        assert_eq!(resolve_word(&words(), 8.5), Some(0));
        assert_eq!(resolve_word(&words(), 7.0), None);
    }

    #[test]
    fn test_untimed_words_skipped() {
        let mut list = words();
        list.insert(
            1,
            Word {
                text: "42".to_string(),
                start: None,
                end: None,
                score: None,
            },
        );
        // Gap after "How" attributes to "How", never the untimed token
        assert_eq!(resolve_word(&list, 10.35), Some(0));
        assert_eq!(resolve_word(&list, 10.5), Some(2));
    }

    #[test]
    fn test_no_words() {
        assert_eq!(resolve_word(&[], 1.0), None);
    }
}
