//! Token-bucket rate limiter for the generation API.
//!
//! The API quota is expressed as "at most N requests per period"; all batch
//! tasks share one limiter so total throughput stays under the quota no
//! matter how many documents are in flight.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Shared token bucket. `capacity` tokens refill linearly over `period`.
pub struct RateLimiter {
    capacity: f64,
    period: Duration,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// A limiter allowing `max_requests` per `period`.
    pub fn new(max_requests: u32, period: Duration) -> Self {
        Self {
            capacity: f64::from(max_requests.max(1)),
            period,
            state: Mutex::new(BucketState {
                tokens: f64::from(max_requests.max(1)),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until one request token is available, then consume it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                // Time until one full token accrues.
                let deficit = 1.0 - state.tokens;
                self.period.mul_f64(deficit / self.capacity)
            };
            sleep(wait).await;
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let elapsed = state.last_refill.elapsed();
        let refill = self.capacity * elapsed.as_secs_f64() / self.period.as_secs_f64();
        state.tokens = (state.tokens + refill).min(self.capacity);
        state.last_refill = Instant::now();
    }
}
