//! Per-key rate limiting.
//!
//! One continuous-refill token bucket per API key, created lazily on the
//! first admission check and discarded when the key is rotated away.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;

struct TokenBucket {
    /// Fractional token count; capped at the configured rate.
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    /// Refill at `rate` tokens/second, then try to take one token.
    fn try_acquire(&mut self, rate: f64, now: Instant) -> bool {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(rate);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Registry of admission-control buckets, one per active API key.
///
/// Independent of the credential store: it never looks at identities, only
/// at key strings. Denial is a normal return value, not an error.
pub struct RateLimiterRegistry {
    permits_per_second: f64,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiterRegistry {
    /// Create a registry applying `permits_per_second` to every new bucket.
    /// Values below 1 are clamped up to 1.
    pub fn new(permits_per_second: u32) -> Self {
        Self {
            permits_per_second: f64::from(permits_per_second.max(1)),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Take one unit of quota for `api_key` if available right now.
    ///
    /// Non-blocking: returns false immediately when the bucket is empty.
    /// The first call for a key creates its bucket full, so a fresh key
    /// admits a full burst of `permits_per_second` requests.
    pub fn admit(&self, api_key: &str) -> bool {
        let rate = self.permits_per_second;
        let now = Instant::now();
        let mut buckets = self.buckets.lock();
        buckets
            .entry(api_key.to_string())
            .or_insert_with(|| TokenBucket::new(rate))
            .try_acquire(rate, now)
    }

    /// Drop the bucket for a key. Called on rotation so stale keys don't
    /// keep holding quota state or memory.
    pub fn discard(&self, api_key: &str) {
        self.buckets.lock().remove(api_key);
    }

    #[cfg(test)]
    pub(crate) fn has_bucket(&self, api_key: &str) -> bool {
        self.buckets.lock().contains_key(api_key)
    }
}
