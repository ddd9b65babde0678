//! chronotag - LLM-assisted span annotation for historical newspaper corpora
//!
//! Sends articles from digitized newspaper corpora to a generative model with
//! a tag-definition prompt, then grounds the model's claimed quotations back
//! into the source text as character spans.
//!
//! # Architecture
//!
//! The pipeline runs in stages:
//! - `corpus` loads articles from per-language CSV exports
//! - `prompt` assembles the instruction prompt from tag set and example files
//! - `driver` fans requests out under a rate limit with bounded retries
//! - `align` resolves each claimed quotation to a span in the article,
//!   exact match first, sliding fuzzy match as fallback
//! - `output` persists one JSON record per article as JSONL
//! - `stats` counts labels per year and source over annotated corpora
//!
//! # Usage
//!
//! ```bash
//! # Annotate the configured English corpus
//! chronotag annotate english
//!
//! # Align one saved response against its article
//! chronotag align --article article.txt --response response.txt
//!
//! # Convert JSONL output to a formatted JSON array
//! chronotag convert annotated.jsonl annotated.json
//! ```

pub mod align;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod output;
pub mod prompt;
pub mod stats;

// Re-export main types at crate root for convenience
pub use align::{align_article, AlignWarning, Alignment, MatchMethod, ResolvedAnnotation};
pub use driver::{BatchRunner, BatchSummary, Document, GeminiClient, RateLimiter, RetryPolicy};
pub use output::{AnnotatedRecord, AnnotationsField};
pub use prompt::PromptBuilder;
