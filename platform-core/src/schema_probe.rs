//! Soft-dependency resolution: is a given kind actually installed on this cluster right now?
//!
//! The catalog may list assets (e.g. a `KubeDescheduler` CR) whose CRD isn't installed on every
//! cluster this operator runs against. Rather than hard-failing, the renderer asks this cache
//! first and skips assets for kinds that aren't present, emitting `missing_dependency`.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::gvk::Gvk;

/// Plurals that don't follow the trailing-`s` heuristic, keyed by `Kind`.
///
/// Seeded with the irregulars the built-in asset catalog actually references; extend this list
/// before reaching for the fallback if a new asset's kind pluralizes irregularly.
fn known_plurals() -> &'static HashMap<&'static str, &'static str> {
    static PLURALS: std::sync::OnceLock<HashMap<&'static str, &'static str>> = std::sync::OnceLock::new();
    PLURALS.get_or_init(|| {
        HashMap::from([
            ("NetworkPolicy", "networkpolicies"),
            ("Endpoints", "endpoints"),
            ("Ingress", "ingresses"),
            ("PodSecurityPolicy", "podsecuritypolicies"),
            ("PriorityClass", "priorityclasses"),
            ("StorageClass", "storageclasses"),
        ])
    })
}

/// Derives the plural resource name for a kind, per [Open Question #3][crate] in the design
/// ledger: a curated table first, a trailing-`s` heuristic as fallback.
pub fn plural_name(kind: &str) -> String {
    if let Some(plural) = known_plurals().get(kind) {
        return (*plural).to_string();
    }
    format!("{}s", kind.to_lowercase())
}

/// Whether a kind's CRD/API is currently discoverable, with a TTL so a transient discovery
/// failure or a newly-installed CRD is re-checked instead of cached forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Supported,
    Missing,
}

struct CacheEntry {
    presence: Presence,
    fetched_at: Instant,
}

/// A TTL-bounded cache over "is this kind's API present on the cluster".
///
/// Modeled on `kube_runtime::reflector::store::Store`'s single `parking_lot`-guarded map: reads
/// and writes both take the same lock, kept short, with no lock held across I/O — the caller
/// performs discovery I/O itself and reports the result via [`SchemaProbe::record`].
pub struct SchemaProbe {
    ttl: Duration,
    cache: Mutex<HashMap<Gvk, CacheEntry>>,
}

impl SchemaProbe {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, cache: Mutex::new(HashMap::new()) }
    }

    /// Returns a cached answer if it's still within `ttl`, else `None` — the caller must then
    /// perform discovery and call [`Self::record`].
    pub fn lookup(&self, gvk: &Gvk) -> Option<Presence> {
        let cache = self.cache.lock();
        cache.get(gvk).and_then(|entry| {
            if entry.fetched_at.elapsed() < self.ttl {
                Some(entry.presence)
            } else {
                None
            }
        })
    }

    /// Records a freshly-observed presence, restarting its TTL.
    pub fn record(&self, gvk: Gvk, presence: Presence) {
        self.cache.lock().insert(gvk, CacheEntry { presence, fetched_at: Instant::now() });
    }

    /// Evicts every cached entry. Used by tests and by the operator's SIGHUP handler, if wired up.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}
