//! Data types for the annotation alignment engine.
//!
//! These types follow the annotated-corpus JSONL schema: each article line
//! carries an `annotations` array of `{Label, Text, Span}` objects.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A (label, claimed text) pair extracted from one `Label:` / `Text:` line
/// pair of the model response. The claimed text is what the model asserts it
/// quoted from the article; it may drift from the actual article text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedSpan {
    pub label: String,
    pub text: String,
}

/// An annotation resolved to a concrete character span of the article.
///
/// `text` is always the actual substring at `span` (which may differ from
/// the claimed text when the fuzzy fallback matched), and `span` is a
/// half-open `[start, end)` interval of zero-based character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAnnotation {
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Span")]
    pub span: [usize; 2],
}

impl ResolvedAnnotation {
    pub fn start(&self) -> usize {
        self.span[0]
    }

    pub fn end(&self) -> usize {
        self.span[1]
    }
}

/// How a span was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Verbatim substring search from the cursor.
    Exact,
    /// Partial-ratio fuzzy alignment over the remaining window.
    Fuzzy,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Fuzzy => "fuzzy",
        }
    }
}

/// Non-fatal diagnostics produced while aligning one article.
///
/// None of these abort processing; they are returned alongside the resolved
/// annotations so callers and tests can assert on skip counts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignWarning {
    /// A line pair failed the `Label:` / `Text:` prefix check and was dropped.
    #[error("malformed line pair at line {line}: {snippet:?}")]
    MalformedPair { line: usize, snippet: String },

    /// The claimed text was empty after quote stripping.
    #[error("empty claimed text for label {label:?}")]
    EmptyClaim { label: String },

    /// Neither exact nor fuzzy search produced a span at or past the cursor.
    #[error("no match for {label:?} claimed text {claimed:?} (best score {best_score:.1})")]
    NoMatch {
        label: String,
        claimed: String,
        best_score: f64,
    },

    /// The cursor had reached the end of the article before this pair.
    #[error("empty search window for {label:?} claimed text {claimed:?}")]
    EmptyWindow { label: String, claimed: String },
}

/// Result of aligning one model response against one article: the resolved
/// annotations, in emission order, plus per-pair diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    pub annotations: Vec<ResolvedAnnotation>,
    pub warnings: Vec<AlignWarning>,
}

impl Alignment {
    /// Number of pairs that parsed but could not be resolved to a span.
    pub fn skipped(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| {
                matches!(
                    w,
                    AlignWarning::NoMatch { .. } | AlignWarning::EmptyWindow { .. }
                )
            })
            .count()
    }
}
