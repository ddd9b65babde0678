//! Span resolution: anchoring claimed spans to article offsets.
//!
//! Resolution is strictly sequential within one article. A forward-only
//! cursor records the end of the last resolved span; every search starts
//! there, which keeps spans non-overlapping and in reading order even when
//! the article repeats short phrases. A pair that fails to resolve is
//! dropped without advancing the cursor, so later pairs are not penalized.
//!
//! Matching is an ordered list of strategies: exact substring search first,
//! then partial-ratio fuzzy alignment. The first strategy to produce a span
//! wins; adding a new strategy means adding one list entry, not new control
//! flow.

use tracing::debug;

use super::fuzzy::partial_align;
use super::parser::parse_response;
use super::types::{AlignWarning, Alignment, ClaimedSpan, MatchMethod, ResolvedAnnotation};

/// Minimum partial-ratio score (0-100) for the fuzzy fallback to accept a
/// candidate window.
pub const MIN_SIMILARITY: f64 = 80.0;

/// A span located by one strategy, relative to the search window.
struct StrategyMatch {
    /// Character offset of the match start within the window.
    rel_start: usize,
    /// Character offset one past the match end within the window.
    rel_end: usize,
    /// The actual window substring that was matched.
    text: String,
    method: MatchMethod,
    score: f64,
}

/// One way of locating a claimed text inside the remaining window.
trait MatchStrategy {
    /// Try to locate `claimed` inside `window`. Offsets in the returned
    /// match are character offsets relative to the window.
    fn locate(&self, window: &str, claimed: &str) -> Option<StrategyMatch>;
}

/// Verbatim substring search; first occurrence wins.
struct ExactStrategy;

impl MatchStrategy for ExactStrategy {
    fn locate(&self, window: &str, claimed: &str) -> Option<StrategyMatch> {
        let byte_start = window.find(claimed)?;
        let rel_start = window[..byte_start].chars().count();
        let len = claimed.chars().count();
        Some(StrategyMatch {
            rel_start,
            rel_end: rel_start + len,
            text: claimed.to_string(),
            method: MatchMethod::Exact,
            score: 100.0,
        })
    }
}

/// Partial-ratio fuzzy alignment with a score cutoff.
struct FuzzyStrategy {
    threshold: f64,
}

impl MatchStrategy for FuzzyStrategy {
    fn locate(&self, window: &str, claimed: &str) -> Option<StrategyMatch> {
        let found = partial_align(claimed, window, self.threshold)?;
        let text: String = window
            .chars()
            .skip(found.start)
            .take(found.end - found.start)
            .collect();
        Some(StrategyMatch {
            rel_start: found.start,
            rel_end: found.end,
            text,
            method: MatchMethod::Fuzzy,
            score: found.score,
        })
    }
}

/// Resolves an ordered sequence of claimed spans against one article.
///
/// Created fresh per article; holds no state across documents.
pub struct Resolver {
    threshold: f64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            threshold: MIN_SIMILARITY,
        }
    }

    /// Override the fuzzy acceptance threshold (0-100).
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Resolve claimed spans in order, advancing the cursor past each
    /// resolved span. Unresolved pairs are recorded as warnings and leave
    /// the cursor untouched.
    pub fn resolve(&self, article: &str, claims: &[ClaimedSpan]) -> Alignment {
        let exact = ExactStrategy;
        let fuzzy = FuzzyStrategy {
            threshold: self.threshold,
        };
        let strategies: [&dyn MatchStrategy; 2] = [&exact, &fuzzy];

        let mut alignment = Alignment::default();
        // Cursor tracked in both units: bytes for slicing, chars for the
        // emitted offsets.
        let mut cursor_bytes = 0usize;
        let mut cursor_chars = 0usize;

        for claim in claims {
            if claim.text.is_empty() {
                alignment.warnings.push(AlignWarning::EmptyClaim {
                    label: claim.label.clone(),
                });
                continue;
            }

            let window = &article[cursor_bytes..];
            if window.is_empty() {
                alignment.warnings.push(AlignWarning::EmptyWindow {
                    label: claim.label.clone(),
                    claimed: claim.text.clone(),
                });
                continue;
            }

            let located = strategies.iter().find_map(|s| s.locate(window, &claim.text));

            match located {
                Some(m) => {
                    debug!(
                        label = %claim.label,
                        method = m.method.as_str(),
                        score = m.score,
                        "resolved span"
                    );
                    let start = cursor_chars + m.rel_start;
                    let end = cursor_chars + m.rel_end;
                    // Advance both cursors past the matched window prefix.
                    cursor_bytes += byte_len_of_chars(window, m.rel_end);
                    cursor_chars = end;
                    alignment.annotations.push(ResolvedAnnotation {
                        label: claim.label.clone(),
                        text: m.text,
                        span: [start, end],
                    });
                }
                None => {
                    let best_score = partial_align(&claim.text, window, 0.0)
                        .map(|a| a.score)
                        .unwrap_or(0.0);
                    alignment.warnings.push(AlignWarning::NoMatch {
                        label: claim.label.clone(),
                        claimed: claim.text.clone(),
                        best_score,
                    });
                }
            }
        }

        alignment
    }
}

/// Byte length of the first `n` characters of `s`.
fn byte_len_of_chars(s: &str, n: usize) -> usize {
    s.char_indices()
        .nth(n)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// Align one raw model response against one article: parse the line pairs,
/// then resolve each claimed span to a concrete character span.
///
/// Pure function of its two inputs; never fails on data-quality problems.
/// An upstream error-placeholder response parses to zero pairs and yields an
/// empty (but warned) alignment.
pub fn align_article(article: &str, response: &str) -> Alignment {
    let (claims, parse_warnings) = parse_response(response);
    let resolver = Resolver::new();
    let mut alignment = resolver.resolve(article, &claims);
    let mut warnings = parse_warnings;
    warnings.append(&mut alignment.warnings);
    alignment.warnings = warnings;
    alignment
}
