//! Per-provider outbound rate limiting.
//!
//! Vendors meter API calls per account (e.g. ATEN allows 120 requests per
//! minute), so the gateway spaces outbound calls by a minimum interval per
//! provider. State is one "last permitted call" timestamp per provider id,
//! guarded by that provider's own mutex so concurrent callers for the same
//! provider serialize while unrelated providers are unaffected.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    last_call: Option<Instant>,
}

/// Minimum-interval gate between outbound vendor calls, keyed by provider id.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    slots: DashMap<String, Arc<Mutex<Slot>>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            slots: DashMap::new(),
        }
    }

    /// Suspend until at least `min_interval` has elapsed since the last
    /// permitted call for `provider_id`, then record this call.
    ///
    /// The timestamp is read and rewritten while the slot mutex is held, so
    /// two concurrent callers cannot both pass on a stale timestamp.
    pub async fn acquire(&self, provider_id: &str) {
        let slot = self
            .slots
            .entry(provider_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Slot::default())))
            .clone();

        let mut guard = slot.lock().await;
        if let Some(last) = guard.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(provider = provider_id, wait_ms = wait.as_millis() as u64, "rate limit wait");
                tokio::time::sleep(wait).await;
            }
        }
        guard.last_call = Some(Instant::now());
    }

    /// The configured minimum spacing between calls.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        for _ in 0..4 {
            limiter.acquire("service3").await;
        }

        // 4 calls => at least 3 full intervals.
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_passes_immediately() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire("service3").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_do_not_share_budget() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.acquire("service3").await;

        // A different provider id is not delayed by service3's timestamp.
        let start = Instant::now();
        limiter.acquire("service2").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_serialize() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(200)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire("service3").await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Even racing callers observe each other's updated timestamps.
        assert!(start.elapsed() >= Duration::from_millis(400));
    }
}
