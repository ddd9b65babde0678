//! Partial-ratio fuzzy alignment.
//!
//! Given a short claimed text and the remaining article window, finds the
//! best-aligned substring of the window and scores it 0-100 with normalized
//! edit similarity. Used only when exact substring search fails; the common
//! failure modes are dropped punctuation, token-boundary truncation, and
//! minor transcription drift.
//!
//! All offsets here are character offsets into the haystack.

use strsim::normalized_levenshtein;

/// Best-aligned window of the haystack for a given needle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyAlignment {
    /// Character offset of the matched window start in the haystack.
    pub start: usize,
    /// Character offset one past the matched window end.
    pub end: usize,
    /// Similarity score in 0-100.
    pub score: f64,
}

/// Find the best partial alignment of `needle` within `haystack`.
///
/// Two passes: a coarse slide of a needle-length window across the haystack,
/// then boundary refinement around the best coarse position so that
/// truncated or slightly longer quotes still snap to the real article text.
/// Returns `None` when either string is empty or the refined score is below
/// `score_cutoff`.
pub fn partial_align(needle: &str, haystack: &str, score_cutoff: f64) -> Option<FuzzyAlignment> {
    let needle_chars: Vec<char> = needle.chars().collect();
    let hay_chars: Vec<char> = haystack.chars().collect();
    let m = needle_chars.len();
    let n = hay_chars.len();
    if m == 0 || n == 0 {
        return None;
    }

    // Coarse pass: fixed windows of the needle's length.
    let window = m.min(n);
    let mut best_start = 0;
    let mut best_score = f64::MIN;
    for start in 0..=(n - window) {
        let candidate: String = hay_chars[start..start + window].iter().collect();
        let score = normalized_levenshtein(needle, &candidate);
        if score > best_score {
            best_score = score;
            best_start = start;
        }
    }

    // Refinement pass: let both boundaries drift so the window can absorb
    // insertions the claimed text dropped (or shed characters it invented).
    let slack = (m / 4).max(2);
    let lo_start = best_start.saturating_sub(slack);
    let hi_start = (best_start + slack).min(n.saturating_sub(1));

    let mut best = FuzzyAlignment {
        start: best_start,
        end: best_start + window,
        score: best_score * 100.0,
    };
    for start in lo_start..=hi_start {
        let lo_end = (start + window.saturating_sub(slack)).max(start + 1);
        let hi_end = (start + window + slack).min(n);
        for end in lo_end..=hi_end {
            let candidate: String = hay_chars[start..end].iter().collect();
            let score = normalized_levenshtein(needle, &candidate) * 100.0;
            if score > best.score {
                best = FuzzyAlignment { start, end, score };
            }
        }
    }

    if best.score >= score_cutoff {
        Some(best)
    } else {
        None
    }
}
