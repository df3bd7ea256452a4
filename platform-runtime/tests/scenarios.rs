//! End-to-end scenarios driven through `reconcile_asset` against an in-memory backend, standing
//! in for the real apiserver these would otherwise need.
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use platform_core::catalog;
use platform_core::gvk::{Gvk, ResourceKey};
use platform_core::renderer::{DeschedulerSchemaVersion, RenderContext};
use platform_runtime::reconciler::{reconcile_asset, ReconcileOutcome, ReconcilerContext, ReconcilerState};
use platform_runtime::{ObjectBackend, Result};
use serde_json::Value;

struct InMemoryBackend {
    live: parking_lot::Mutex<HashMap<String, Value>>,
    supported_kinds: parking_lot::Mutex<std::collections::HashSet<String>>,
}

impl InMemoryBackend {
    fn new(supported: &[&str]) -> Self {
        Self {
            live: parking_lot::Mutex::new(HashMap::new()),
            supported_kinds: parking_lot::Mutex::new(supported.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[async_trait]
impl ObjectBackend for InMemoryBackend {
    async fn get(&self, key: &ResourceKey) -> Result<Option<Value>> {
        Ok(self.live.lock().get(&key.to_string()).cloned())
    }

    async fn dry_run_apply(&self, _key: &ResourceKey, desired: &Value) -> Result<Value> {
        Ok(desired.clone())
    }

    async fn apply(&self, key: &ResourceKey, desired: &Value) -> Result<Value> {
        self.live.lock().insert(key.to_string(), desired.clone());
        Ok(desired.clone())
    }

    async fn kind_supported(&self, gvk: &Gvk, _plural: &str) -> Result<bool> {
        Ok(self.supported_kinds.lock().contains(&gvk.kind))
    }
}

fn render_ctx(schema: DeschedulerSchemaVersion, back_compat: bool) -> RenderContext {
    RenderContext {
        platform_name: "prod".into(),
        namespace: "virt-platform".into(),
        eviction_limit: 5,
        parallel_migrations_per_node: 2,
        descheduler_schema: schema,
        back_compat,
    }
}

#[tokio::test]
async fn kube_descheduler_profile_tracks_installed_schema_version() {
    let backend = Arc::new(InMemoryBackend::new(&["KubeDescheduler"]));
    let state = ReconcilerState::new(10, Duration::from_secs(60), 3, Duration::from_secs(30));
    let ctx = ReconcilerContext { state: &state, backend: backend.clone(), events: None };
    let asset = catalog::assets().into_iter().find(|a| a.id == "kube-descheduler").unwrap();
    let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "prod-descheduler");

    reconcile_asset(&ctx, &asset, &key, &render_ctx(DeschedulerSchemaVersion::A, false), &BTreeMap::new())
        .await
        .unwrap();
    let rendered = backend.live.lock().get(&key.to_string()).cloned().unwrap();
    assert_eq!(rendered["spec"]["profile"], "LongLifecycle");

    reconcile_asset(&ctx, &asset, &key, &render_ctx(DeschedulerSchemaVersion::B, false), &BTreeMap::new())
        .await
        .unwrap();
    let rendered = backend.live.lock().get(&key.to_string()).cloned().unwrap();
    assert_eq!(rendered["spec"]["profile"], "DevKubeVirtRelieveAndMigrate");

    reconcile_asset(&ctx, &asset, &key, &render_ctx(DeschedulerSchemaVersion::C, false), &BTreeMap::new())
        .await
        .unwrap();
    let rendered = backend.live.lock().get(&key.to_string()).cloned().unwrap();
    assert_eq!(rendered["spec"]["profile"], "KubeVirtRelieveAndMigrate");

    reconcile_asset(&ctx, &asset, &key, &render_ctx(DeschedulerSchemaVersion::C, true), &BTreeMap::new())
        .await
        .unwrap();
    let rendered = backend.live.lock().get(&key.to_string()).cloned().unwrap();
    assert_eq!(rendered["spec"]["profile"], "DevKubeVirtRelieveAndMigrate");
}

#[tokio::test]
async fn descheduler_asset_is_skipped_when_crd_not_installed() {
    let backend = Arc::new(InMemoryBackend::new(&[])); // nothing installed
    let state = ReconcilerState::new(10, Duration::from_secs(60), 3, Duration::from_secs(30));
    let ctx = ReconcilerContext { state: &state, backend: backend.clone(), events: None };
    let asset = catalog::assets().into_iter().find(|a| a.id == "kube-descheduler").unwrap();
    let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "prod-descheduler");

    let outcome =
        reconcile_asset(&ctx, &asset, &key, &render_ctx(DeschedulerSchemaVersion::C, false), &BTreeMap::new())
            .await
            .unwrap();
    assert_eq!(outcome, ReconcileOutcome::DependencyMissing);
    assert!(backend.live.lock().get(&key.to_string()).is_none());
}

#[tokio::test]
async fn live_migration_defaults_flow_through_to_config_map() {
    let backend = Arc::new(InMemoryBackend::new(&[]));
    let state = ReconcilerState::new(10, Duration::from_secs(60), 3, Duration::from_secs(30));
    let ctx = ReconcilerContext { state: &state, backend: backend.clone(), events: None };
    let asset = catalog::assets().into_iter().find(|a| a.id == "migration-config").unwrap();
    let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "prod-migration-config");

    reconcile_asset(&ctx, &asset, &key, &render_ctx(DeschedulerSchemaVersion::A, false), &BTreeMap::new())
        .await
        .unwrap();
    let rendered = backend.live.lock().get(&key.to_string()).cloned().unwrap();
    assert_eq!(rendered["data"]["evictionLimit"], "5");
    assert_eq!(rendered["data"]["parallelMigrationsPerNode"], "2");
}

#[tokio::test]
async fn thrash_pause_annotation_is_honored_on_the_next_reconcile() {
    let backend = Arc::new(InMemoryBackend::new(&[]));
    // Zero capacity: every apply attempt is throttled immediately.
    let state = ReconcilerState::new(0, Duration::from_secs(60), 1, Duration::from_secs(30));
    let ctx = ReconcilerContext { state: &state, backend: backend.clone(), events: None };
    let asset = catalog::assets().into_iter().find(|a| a.id == "migration-config").unwrap();
    let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "prod-migration-config");

    // threshold 1: the very first throttle already tips into a sticky pause and writes the
    // annotation back onto the object.
    let outcome =
        reconcile_asset(&ctx, &asset, &key, &render_ctx(DeschedulerSchemaVersion::A, false), &BTreeMap::new())
            .await
            .unwrap();
    assert_eq!(outcome, ReconcileOutcome::ThrashPaused);

    let live = backend.live.lock().get(&key.to_string()).cloned().unwrap();
    let annotations: BTreeMap<String, String> = live["metadata"]["annotations"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect();

    // Feeding the annotation the operator itself just wrote back in as if this were the next
    // reconcile (a fresh in-memory state, as happens across a process restart) must re-pause.
    let fresh_state = ReconcilerState::new(10, Duration::from_secs(60), 3, Duration::from_secs(30));
    let fresh_ctx = ReconcilerContext { state: &fresh_state, backend: backend.clone(), events: None };
    let outcome =
        reconcile_asset(&fresh_ctx, &asset, &key, &render_ctx(DeschedulerSchemaVersion::A, false), &annotations)
            .await
            .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Paused);
}
