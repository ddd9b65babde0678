//! Annotation alignment engine.
//!
//! Consumes one article's full text and one raw model response, and produces
//! an ordered sequence of span-located annotations plus diagnostics. This is
//! the core of the system: everything around it (corpus loading, prompting,
//! the generation driver, persistence) is I/O glue.
//!
//! # Design
//!
//! - **Forward-only cursor**: model responses list annotations in reading
//!   order and newspaper text repeats short phrases, so every search starts
//!   at the end of the last resolved span. Spans are non-overlapping by
//!   construction.
//! - **Two-phase matching**: exact substring search handles near-verbatim
//!   quoting cheaply; a partial-ratio fuzzy fallback (threshold 80) recovers
//!   quotes with dropped punctuation or transcription drift.
//! - **Never aborts on data quality**: malformed pairs, failed matches, and
//!   upstream error placeholders all degrade to warnings.
//!
//! # Example
//!
//! ```
//! use chronotag::align::align_article;
//!
//! let article = "The boy worked twelve hours in the mill.";
//! let response = "Label: Workplace\nText: \"worked twelve hours in the mill\"";
//!
//! let alignment = align_article(article, response);
//! assert_eq!(alignment.annotations.len(), 1);
//! assert_eq!(alignment.annotations[0].span, [8, 39]);
//! ```

pub mod fuzzy;
pub mod parser;
pub mod resolver;
pub mod types;

pub use fuzzy::{partial_align, FuzzyAlignment};
pub use parser::parse_response;
pub use resolver::{align_article, Resolver, MIN_SIMILARITY};
pub use types::{AlignWarning, Alignment, ClaimedSpan, MatchMethod, ResolvedAnnotation};
