//! Concurrent batch annotation runner.
//!
//! Every document of a batch is submitted as an independent task, gated by
//! the shared rate limiter; completions are consumed in whatever order they
//! finish. Each completed response is aligned against its own article and
//! appended as one JSON line, so a crashed batch keeps everything written so
//! far. Alignment state is strictly per-document; nothing is shared between
//! tasks except the limiter.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::align::align_article;
use crate::output::record::{AnnotatedRecord, AnnotationsField};

use super::{Generator, RateLimiter, RetryPolicy};

/// One document ready for annotation: corpus id, full article text, and the
/// prompt built for it.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub article: String,
    pub prompt: String,
}

/// What happened to a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Documents written to the output file.
    pub documents: usize,
    /// Total resolved annotations across all documents.
    pub annotations: usize,
    /// Documents whose response was a retry-exhaustion placeholder.
    pub generation_failures: usize,
    /// Total alignment warnings across all documents.
    pub warnings: usize,
}

/// Drives a batch of documents through generation and alignment.
pub struct BatchRunner<G> {
    generator: Arc<G>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl<G: Generator + 'static> BatchRunner<G> {
    pub fn new(generator: G, limiter: RateLimiter, retry: RetryPolicy) -> Self {
        Self {
            generator: Arc::new(generator),
            limiter: Arc::new(limiter),
            retry,
        }
    }

    /// Annotate all documents and append one JSON record per document to
    /// `output_path`. Records are written in completion order.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn annotate_batch(
        &self,
        documents: Vec<Document>,
        output_path: &Path,
    ) -> Result<BatchSummary> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut output = OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_path)
            .await
            .with_context(|| format!("Failed to open {}", output_path.display()))?;

        let mut tasks = JoinSet::new();
        for document in documents {
            let generator = Arc::clone(&self.generator);
            let limiter = Arc::clone(&self.limiter);
            let retry = self.retry.clone();
            tasks.spawn(async move {
                let response =
                    generate_with_retry(generator.as_ref(), &limiter, &retry, &document.prompt)
                        .await;
                (document, response)
            });
        }

        let mut summary = BatchSummary::default();
        while let Some(joined) = tasks.join_next().await {
            let (document, response) = joined.context("Annotation task panicked")?;

            if response.failed {
                summary.generation_failures += 1;
            }

            let alignment = align_article(&document.article, &response.text);
            for warning in &alignment.warnings {
                warn!(id = %document.id, %warning, "alignment diagnostic");
            }
            summary.annotations += alignment.annotations.len();
            summary.warnings += alignment.warnings.len();

            let record = AnnotatedRecord {
                id: document.id.clone(),
                article: document.article.clone(),
                annotations: AnnotationsField::Nested(alignment.annotations),
            };
            let mut line = serde_json::to_string(&record)
                .with_context(|| format!("Failed to serialize record {}", document.id))?;
            line.push('\n');
            output
                .write_all(line.as_bytes())
                .await
                .with_context(|| format!("Failed to write record {}", document.id))?;
            summary.documents += 1;
        }
        output.flush().await?;

        info!(
            documents = summary.documents,
            annotations = summary.annotations,
            failures = summary.generation_failures,
            "batch complete"
        );
        Ok(summary)
    }
}

struct DriverResponse {
    text: String,
    failed: bool,
}

/// Call the generator with bounded retries. Retry exhaustion degrades to a
/// placeholder string that flows downstream as data; the alignment engine
/// parses it to zero pairs.
async fn generate_with_retry(
    generator: &dyn Generator,
    limiter: &RateLimiter,
    retry: &RetryPolicy,
    prompt: &str,
) -> DriverResponse {
    let mut attempt = 0;
    loop {
        attempt += 1;
        limiter.acquire().await;
        match generator.generate(prompt).await {
            Ok(text) => {
                return DriverResponse {
                    text,
                    failed: false,
                }
            }
            Err(e) => {
                if retry.should_retry(attempt) {
                    warn!(backend = generator.name(), attempt, error = %e, "generation failed, retrying");
                    tokio::time::sleep(retry.delay_for_attempt(attempt)).await;
                } else {
                    warn!(backend = generator.name(), attempt, error = %e, "generation retries exhausted");
                    return DriverResponse {
                        text: format!("Error after {} retries: {}", retry.max_attempts, e),
                        failed: true,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::driver::GenerateError;

    struct FailingGenerator {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Generator for FailingGenerator {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GenerateError::EmptyResponse)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_exhaustion_yields_placeholder_string() {
        let generator = FailingGenerator {
            calls: AtomicU32::new(0),
        };
        let limiter = RateLimiter::new(100, Duration::from_secs(1));
        let retry = RetryPolicy {
            max_attempts: 3,
            initial_delay_ms: 10,
            ..Default::default()
        };

        let response = generate_with_retry(&generator, &limiter, &retry, "prompt").await;

        assert!(response.failed);
        assert!(response.text.starts_with("Error after 3 retries:"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }
}
