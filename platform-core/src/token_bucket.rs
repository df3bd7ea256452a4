//! Per-key token bucket rate limiting.
//!
//! Every write the applier makes to the cluster is gated by a bucket keyed on the object's
//! [`crate::gvk::ResourceKey`], so a single flapping object can't dominate the operator's write
//! budget against the API server.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::gvk::ResourceKey;

struct Bucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: u32, window: Duration) -> Self {
        let capacity = capacity as f64;
        Self {
            tokens: capacity,
            capacity,
            refill_per_sec: capacity / window.as_secs_f64().max(f64::EPSILON),
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn try_take(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// A collection of independent per-key token buckets, sharing one `capacity`/`window`
/// configuration.
///
/// Modeled on `kube_runtime::reflector::store::Store`'s shape: a single `parking_lot::Mutex`
/// guarding a `HashMap`, with buckets created lazily on first use so the map only grows to the
/// number of distinct objects actually reconciled.
pub struct TokenBucket {
    capacity: u32,
    window: Duration,
    buckets: Mutex<HashMap<ResourceKey, Bucket>>,
}

impl TokenBucket {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self { capacity, window, buckets: Mutex::new(HashMap::new()) }
    }

    /// An effectively-unlimited bucket, used for writes that must never be throttled (see the
    /// pause-annotation write in the design ledger's Open Question #1).
    pub fn unlimited() -> Self {
        Self::new(u32::MAX, Duration::from_secs(1))
    }

    /// Attempts to take one token for `key`. `true` means the caller may proceed with its write;
    /// `false` means it must back off.
    pub fn try_acquire(&self, key: &ResourceKey) -> bool {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key.clone()).or_insert_with(|| Bucket::new(self.capacity, self.window));
        bucket.try_take()
    }

    /// Drops the bucket for `key`, e.g. when an object is deleted and its key will never recur.
    pub fn forget(&self, key: &ResourceKey) {
        self.buckets.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gvk::Gvk;

    fn key(name: &str) -> ResourceKey {
        ResourceKey::new(Gvk::new("apps", "v1", "Deployment"), Some("ns".into()), name)
    }

    #[test]
    fn allows_up_to_capacity_then_denies() {
        let bucket = TokenBucket::new(3, Duration::from_secs(60));
        let key = key("a");
        assert!(bucket.try_acquire(&key));
        assert!(bucket.try_acquire(&key));
        assert!(bucket.try_acquire(&key));
        assert!(!bucket.try_acquire(&key));
    }

    #[test]
    fn distinct_keys_have_independent_budgets() {
        let bucket = TokenBucket::new(1, Duration::from_secs(60));
        assert!(bucket.try_acquire(&key("a")));
        assert!(bucket.try_acquire(&key("b")));
        assert!(!bucket.try_acquire(&key("a")));
    }

    #[test]
    fn refills_over_time() {
        let bucket = TokenBucket::new(1, Duration::from_millis(20));
        let key = key("a");
        assert!(bucket.try_acquire(&key));
        assert!(!bucket.try_acquire(&key));
        std::thread::sleep(Duration::from_millis(30));
        assert!(bucket.try_acquire(&key));
    }

    #[test]
    fn unlimited_bucket_never_denies() {
        let bucket = TokenBucket::unlimited();
        let key = key("a");
        for _ in 0..10_000 {
            assert!(bucket.try_acquire(&key));
        }
    }

    #[test]
    fn forget_resets_budget() {
        let bucket = TokenBucket::new(1, Duration::from_secs(60));
        let key = key("a");
        assert!(bucket.try_acquire(&key));
        assert!(!bucket.try_acquire(&key));
        bucket.forget(&key);
        assert!(bucket.try_acquire(&key));
    }

    #[test]
    fn concurrent_acquires_never_exceed_capacity() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let bucket = TokenBucket::new(50, Duration::from_secs(3600));
        let key = key("shared");
        let granted = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..10 {
                let bucket = &bucket;
                let key = &key;
                let granted = &granted;
                scope.spawn(move || {
                    for _ in 0..20 {
                        if bucket.try_acquire(key) {
                            granted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });
        assert!(granted.load(Ordering::SeqCst) <= 50);
    }
}
