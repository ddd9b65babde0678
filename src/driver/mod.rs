//! Prompt/response driver for the generation API.
//!
//! The driver owns everything the alignment engine must not care about:
//! HTTP transport, rate limiting, bounded retries, and batch concurrency.
//! Its one promise to the engine is that each document yields exactly one
//! response string, which is either model output or a retry-exhaustion
//! placeholder the engine can parse to zero pairs.

pub mod gemini;
pub mod limiter;
pub mod runner;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::GeminiClient;
pub use limiter::RateLimiter;
pub use runner::{BatchRunner, BatchSummary, Document};

/// Errors from a generation backend.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("response contained no candidate text")]
    EmptyResponse,
}

/// A text-generation backend. One prompt in, one response string out.
///
/// Implementations must be shareable across tasks; the batch runner calls
/// `generate` from many concurrent documents.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable backend name (used in logs).
    fn name(&self) -> &str;

    /// Submit one prompt and return the raw response text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Bounded-retry policy for generation calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Cap on the delay between retries, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after each failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30_000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given failed attempt (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }
        let delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);
        Duration::from_millis(delay.min(self.max_delay_ms as f64) as u64)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
