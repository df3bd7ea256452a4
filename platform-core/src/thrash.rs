//! Thrash detection: an object that gets throttled too many times in a row is paused rather than
//! left to retry forever against an exhausted bucket.
use std::collections::HashMap;

use parking_lot::Mutex;

use crate::gvk::ResourceKey;

#[derive(Debug, Clone, Copy, Default)]
struct ThrashState {
    consecutive_throttles: u32,
    paused: bool,
}

/// Tracks consecutive-throttle counts per [`ResourceKey`] and flips to a sticky "paused" state
/// once a threshold is crossed.
///
/// "Sticky" means [`Self::record_success`] clears the counter but does *not* clear `paused` —
/// only [`Self::clear_pause`] does, which the reconciler calls once it has actually written the
/// `reconcile-paused` annotation back to the object (see `platform-runtime::reconciler`), so the
/// in-memory state and the on-cluster annotation never disagree about who's responsible for
/// un-pausing.
pub struct ThrashDetector {
    threshold: u32,
    state: Mutex<HashMap<ResourceKey, ThrashState>>,
}

impl ThrashDetector {
    pub fn new(threshold: u32) -> Self {
        Self { threshold, state: Mutex::new(HashMap::new()) }
    }

    /// Records that `key`'s reconcile was throttled by the token bucket. Returns `true` the
    /// moment the threshold is crossed (i.e. exactly once per thrash episode, not on every
    /// subsequent throttle).
    pub fn record_throttle(&self, key: &ResourceKey) -> bool {
        let mut state = self.state.lock();
        let entry = state.entry(key.clone()).or_default();
        entry.consecutive_throttles += 1;
        if entry.consecutive_throttles == self.threshold && !entry.paused {
            entry.paused = true;
            return true;
        }
        false
    }

    /// Records a reconcile that completed without being throttled, resetting the streak.
    pub fn record_success(&self, key: &ResourceKey) {
        let mut state = self.state.lock();
        if let Some(entry) = state.get_mut(key) {
            entry.consecutive_throttles = 0;
        }
    }

    /// `true` if `key` is currently in the sticky paused state.
    pub fn is_paused(&self, key: &ResourceKey) -> bool {
        self.state.lock().get(key).is_some_and(|entry| entry.paused)
    }

    /// Clears the sticky pause, called once the pause annotation has actually been written.
    pub fn clear_pause(&self, key: &ResourceKey) {
        if let Some(entry) = self.state.lock().get_mut(key) {
            entry.paused = false;
            entry.consecutive_throttles = 0;
        }
    }

    pub fn forget(&self, key: &ResourceKey) {
        self.state.lock().remove(key);
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
    fn crosses_threshold_exactly_once() {
        let detector = ThrashDetector::new(3);
        let key = key("a");
        assert!(!detector.record_throttle(&key));
        assert!(!detector.record_throttle(&key));
        assert!(detector.record_throttle(&key));
        assert!(detector.record_throttle(&key) == false); // already paused, no re-trigger
        assert!(detector.is_paused(&key));
    }

    #[test]
    fn success_resets_streak_but_not_pause() {
        let detector = ThrashDetector::new(2);
        let key = key("a");
        detector.record_throttle(&key);
        detector.record_throttle(&key);
        assert!(detector.is_paused(&key));
        detector.record_success(&key);
        assert!(detector.is_paused(&key), "success alone must not clear the sticky pause");
    }

    #[test]
    fn clear_pause_resets_both_paused_and_streak() {
        let detector = ThrashDetector::new(2);
        let key = key("a");
        detector.record_throttle(&key);
        detector.record_throttle(&key);
        detector.clear_pause(&key);
        assert!(!detector.is_paused(&key));
        assert!(!detector.record_throttle(&key));
    }

    #[test]
    fn unrelated_key_starts_unpaused() {
        let detector = ThrashDetector::new(2);
        assert!(!detector.is_paused(&key("never-seen")));
    }

    #[test]
    fn concurrent_record_throttle_triggers_pause_at_most_once_per_episode() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let detector = ThrashDetector::new(5);
        let key = key("shared");
        let trigger_count = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..5 {
                let detector = &detector;
                let key = &key;
                let trigger_count = &trigger_count;
                scope.spawn(move || {
                    if detector.record_throttle(key) {
                        trigger_count.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(trigger_count.load(Ordering::SeqCst), 1);
    }
}
