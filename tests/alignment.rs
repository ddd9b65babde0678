//! Alignment Integration Tests
//!
//! End-to-end tests of response parsing and span resolution against
//! realistic article/response pairs.

use chronotag::align::{align_article, AlignWarning};

const ARTICLE: &str = "The factory inspector reported that children as young as nine \
were employed in the spinning rooms. Wages were paid weekly, and the youngest hands \
received two shillings. A local magistrate described the conditions as deplorable.";

#[test]
fn resolves_multiple_claims_in_order() {
    let response = "\
Label: Child labour
Text: \"children as young as nine were employed in the spinning rooms\"
Label: Wages
Text: \"the youngest hands received two shillings\"
Label: Judgment
Text: \"described the conditions as deplorable\"
";

    let alignment = align_article(ARTICLE, response);
    assert!(alignment.warnings.is_empty(), "{:?}", alignment.warnings);
    assert_eq!(alignment.annotations.len(), 3);

    // Spans are grounded: the slice at each span equals the annotation text.
    let chars: Vec<char> = ARTICLE.chars().collect();
    for ann in &alignment.annotations {
        let slice: String = chars[ann.start()..ann.end()].iter().collect();
        assert_eq!(slice, ann.text);
    }

    // Spans are strictly ordered and non-overlapping.
    for pair in alignment.annotations.windows(2) {
        assert!(pair[0].end() <= pair[1].start());
    }
}

#[test]
fn fuzzy_fallback_recovers_paraphrased_quote() {
    // Model dropped a word and changed capitalization; exact match fails.
    let response = "\
Label: Wages
Text: \"the youngest hands recieved two shillings\"
";

    let alignment = align_article(ARTICLE, response);
    assert_eq!(alignment.annotations.len(), 1);
    let ann = &alignment.annotations[0];

    // Emitted text is the actual article substring, not the claimed typo.
    let chars: Vec<char> = ARTICLE.chars().collect();
    let slice: String = chars[ann.start()..ann.end()].iter().collect();
    assert_eq!(slice, ann.text);
    assert!(ann.text.contains("two shillings"), "got {:?}", ann.text);
    assert!(!ann.text.contains("recieved"));
}

#[test]
fn fabricated_quote_is_skipped_without_advancing_cursor() {
    let response = "\
Label: Child labour
Text: \"children as young as nine\"
Label: Invented
Text: \"the owner donated a library to the town\"
Label: Judgment
Text: \"described the conditions as deplorable\"
";

    let alignment = align_article(ARTICLE, response);
    assert_eq!(alignment.annotations.len(), 2);
    assert!(alignment
        .warnings
        .iter()
        .any(|w| matches!(w, AlignWarning::NoMatch { label, .. } if label == "Invented")));

    // The claim after the skipped one still resolves.
    assert_eq!(alignment.annotations[1].label, "Judgment");
}

#[test]
fn repeated_phrase_anchors_forward() {
    let article = "He said yes. She said yes. They said yes.";
    let response = "\
Label: A
Text: \"said yes\"
Label: B
Text: \"said yes\"
Label: C
Text: \"said yes\"
";

    let alignment = align_article(article, response);
    assert_eq!(alignment.annotations.len(), 3);
    let starts: Vec<usize> = alignment.annotations.iter().map(|a| a.start()).collect();
    assert!(starts[0] < starts[1] && starts[1] < starts[2]);
}

#[test]
fn error_placeholder_yields_no_annotations() {
    let alignment = align_article(ARTICLE, "Error after 3 retries: deadline exceeded");
    assert!(alignment.annotations.is_empty());
    // The placeholder line itself is reported as one malformed pair.
    assert_eq!(alignment.warnings.len(), 1);
}

#[test]
fn malformed_pairs_are_reported_not_fatal() {
    let response = "\
Here are the annotations you asked for:
Label: Child labour
Text: \"children as young as nine\"
";

    let alignment = align_article(ARTICLE, response);
    // Preamble line desynchronizes the pair scan; the parser reports it.
    assert!(!alignment.warnings.is_empty());
}

#[test]
fn multibyte_articles_use_character_offsets() {
    let article = "工厂雇用了许多童工，他们每天工作十二小时。";
    let response = "\
Label: 童工
Text: \"许多童工\"
";

    let alignment = align_article(article, response);
    assert_eq!(alignment.annotations.len(), 1);
    let ann = &alignment.annotations[0];

    let chars: Vec<char> = article.chars().collect();
    let slice: String = chars[ann.start()..ann.end()].iter().collect();
    assert_eq!(slice, "许多童工");
}
