//! Writes a rendered manifest to the cluster, rate-limited and stamped with the adoption label.
use std::sync::Arc;

use platform_core::annotations::{MANAGED_BY_LABEL, MANAGED_BY_VALUE};
use platform_core::gvk::ResourceKey;
use platform_core::token_bucket::TokenBucket;
use serde_json::Value;

use crate::backend::ObjectBackend;
use crate::error::{Error, Result};

/// Performs the actual write half of the reconcile loop.
pub struct Applier {
    backend: Arc<dyn ObjectBackend>,
    bucket: Arc<TokenBucket>,
}

impl Applier {
    pub fn new(backend: Arc<dyn ObjectBackend>, bucket: Arc<TokenBucket>) -> Self {
        Self { backend, bucket }
    }

    /// Stamps the adoption label onto `desired` and applies it, provided the token bucket for
    /// `key` has budget. Returns [`Error::Throttled`] without writing if it doesn't.
    pub async fn apply(&self, key: &ResourceKey, desired: &Value) -> Result<Value> {
        if !self.bucket.try_acquire(key) {
            return Err(Error::Throttled(key.clone()));
        }
        let stamped = stamp_adoption_label(desired);
        self.backend.apply(key, &stamped).await
    }
}

/// Adds [`MANAGED_BY_LABEL`] to the manifest's `metadata.labels` without disturbing any other
/// labels the renderer already set.
pub(crate) fn stamp_adoption_label(desired: &Value) -> Value {
    let mut stamped = desired.clone();
    let labels = stamped
        .as_object_mut()
        .and_then(|obj| obj.entry("metadata").or_insert_with(|| Value::Object(Default::default())).as_object_mut())
        .map(|meta| meta.entry("labels").or_insert_with(|| Value::Object(Default::default())));
    if let Some(labels) = labels.and_then(|v| v.as_object_mut()) {
        labels.insert(MANAGED_BY_LABEL.to_string(), Value::String(MANAGED_BY_VALUE.to_string()));
    }
    stamped
}
