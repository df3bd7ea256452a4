//! Drift detection: is the live object already what we'd render, modulo ignored fields?
use platform_core::gvk::ResourceKey;
use platform_core::tree::DynTree;
use serde_json::Value;

use crate::backend::ObjectBackend;
use crate::error::Result;

/// The outcome of comparing a desired manifest against the cluster's server-side-apply dry run.
#[derive(Debug, Clone, PartialEq)]
pub enum DriftResult {
    /// The dry run reproduced the live object: nothing to write.
    InSync,
    /// The dry run would change the object. `would_be` is what the server said it would become.
    Drifted { would_be: Value },
}

/// Computes [`DriftResult`] for `key` by dry-run applying `desired` (already masked via
/// `ignore-fields`) and comparing the result against the current live object (masked the same
/// way).
///
/// Both sides are compared as [`DynTree`]s after masking rather than as raw JSON strings, since
/// the server may reorder map keys or normalize defaults that have no effect on the object's
/// actual meaning.
pub async fn detect(
    backend: &dyn ObjectBackend,
    key: &ResourceKey,
    desired: &Value,
    ignore_fields: &[String],
) -> Result<DriftResult> {
    let live = backend.get(key).await?;
    let Some(live) = live else {
        return Ok(DriftResult::Drifted { would_be: desired.clone() });
    };

    let would_be = backend.dry_run_apply(key, desired).await?;

    let mut would_be_tree = DynTree::new(would_be.clone());
    let mut live_tree = DynTree::new(live);
    for pointer in ignore_fields {
        let _ = would_be_tree.remove(pointer);
        let _ = live_tree.remove(pointer);
    }

    if would_be_tree.as_value() == live_tree.as_value() {
        Ok(DriftResult::InSync)
    } else {
        Ok(DriftResult::Drifted { would_be })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use platform_core::gvk::Gvk;
    use serde_json::json;
    use std::collections::HashMap;

    struct StubBackend {
        live: Mutex<HashMap<String, Value>>,
        dry_run_result: Value,
    }

    #[async_trait]
    impl ObjectBackend for StubBackend {
        async fn get(&self, key: &ResourceKey) -> Result<Option<Value>> {
            Ok(self.live.lock().get(&key.to_string()).cloned())
        }
        async fn dry_run_apply(&self, _key: &ResourceKey, _desired: &Value) -> Result<Value> {
            Ok(self.dry_run_result.clone())
        }
        async fn apply(&self, _key: &ResourceKey, desired: &Value) -> Result<Value> {
            Ok(desired.clone())
        }
        async fn kind_supported(&self, _gvk: &Gvk, _plural: &str) -> Result<bool> {
            Ok(true)
        }
    }

    fn key() -> ResourceKey {
        ResourceKey::new(Gvk::new("apps", "v1", "Deployment"), Some("ns".into()), "web")
    }

    #[tokio::test]
    async fn missing_object_is_drifted() {
        let backend = StubBackend { live: Mutex::new(HashMap::new()), dry_run_result: json!({}) };
        let result = detect(&backend, &key(), &json!({"spec": {"replicas": 3}}), &[]).await.unwrap();
        assert!(matches!(result, DriftResult::Drifted { .. }));
    }

    #[tokio::test]
    async fn matching_dry_run_and_live_is_in_sync() {
        let live = json!({"spec": {"replicas": 3}});
        let mut store = HashMap::new();
        store.insert(key().to_string(), live.clone());
        let backend = StubBackend { live: Mutex::new(store), dry_run_result: live };
        let result = detect(&backend, &key(), &json!({"spec": {"replicas": 3}}), &[]).await.unwrap();
        assert_eq!(result, DriftResult::InSync);
    }

    #[tokio::test]
    async fn mismatched_field_is_drifted() {
        let live = json!({"spec": {"replicas": 3}});
        let dry_run = json!({"spec": {"replicas": 5}});
        let mut store = HashMap::new();
        store.insert(key().to_string(), live);
        let backend = StubBackend { live: Mutex::new(store), dry_run_result: dry_run };
        let result = detect(&backend, &key(), &json!({"spec": {"replicas": 5}}), &[]).await.unwrap();
        assert!(matches!(result, DriftResult::Drifted { .. }));
    }

    #[tokio::test]
    async fn ignored_field_mismatch_is_in_sync() {
        let live = json!({"spec": {"replicas": 3, "image": "old"}});
        let dry_run = json!({"spec": {"replicas": 3, "image": "new"}});
        let mut store = HashMap::new();
        store.insert(key().to_string(), live);
        let backend = StubBackend { live: Mutex::new(store), dry_run_result: dry_run };
        let result =
            detect(&backend, &key(), &json!({"spec": {"replicas": 3, "image": "new"}}), &["/spec/image".to_string()])
                .await
                .unwrap();
        assert_eq!(result, DriftResult::InSync);
    }
}
