//! Parser for the model's free-text annotation response.
//!
//! The expected wire convention is one `Label: <value>` line immediately
//! followed by one `Text: "<value>"` line per annotation, optionally
//! separated by blank lines. Model output is unreliable by nature, so any
//! line pair that fails the prefix check is dropped with a warning rather
//! than aborting the run. A retry-exhaustion placeholder string from the
//! driver simply parses to zero pairs.

use super::types::{AlignWarning, ClaimedSpan};

const LABEL_PREFIX: &str = "Label:";
const TEXT_PREFIX: &str = "Text:";

/// Parse a raw response into ordered claimed spans plus diagnostics for
/// dropped pairs. Order is preserved and nothing is deduplicated.
pub fn parse_response(response: &str) -> (Vec<ClaimedSpan>, Vec<AlignWarning>) {
    // Each entry keeps its 1-based line number in the original response so
    // diagnostics stay accurate when blank lines are dropped.
    let lines: Vec<(usize, &str)> = response
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    let mut claims = Vec::new();
    let mut warnings = Vec::new();

    // Strict two-at-a-time scan: a stray line desynchronizes its pair
    // position, which is dropped without resyncing.
    let mut i = 0;
    while i < lines.len() {
        if i + 1 < lines.len()
            && lines[i].1.starts_with(LABEL_PREFIX)
            && lines[i + 1].1.starts_with(TEXT_PREFIX)
        {
            let label = lines[i].1[LABEL_PREFIX.len()..].trim().to_string();
            let text = strip_quotes(lines[i + 1].1[TEXT_PREFIX.len()..].trim());
            claims.push(ClaimedSpan {
                label,
                text: text.to_string(),
            });
        } else {
            warnings.push(AlignWarning::MalformedPair {
                line: lines[i].0,
                snippet: truncate(lines[i].1, 80),
            });
        }
        i += 2;
    }

    (claims, warnings)
}

/// Strip exactly one layer of surrounding double quotes, and only when both
/// the first and last character are `"`.
fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
