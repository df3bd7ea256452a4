//! The composed reconcile algorithm: schema gate, override application, drift detection, rate
//! limited apply, thrash governance, and the bookkeeping events/annotations that go with each.
use std::sync::Arc;
use std::time::Duration;

use platform_core::annotations::{InstallMode, Overrides, RECONCILE_PAUSED};
use platform_core::catalog::Asset;
use platform_core::gvk::{Gvk, ResourceKey};
use platform_core::override_engine;
use platform_core::renderer::RenderContext;
use platform_core::schema_probe::{Presence, SchemaProbe};
use platform_core::thrash::ThrashDetector;
use platform_core::token_bucket::TokenBucket;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::applier::stamp_adoption_label;
use crate::backend::ObjectBackend;
use crate::drift::{self, DriftResult};
use crate::error::{Error, Result};
use crate::events::{EventPublisher, ReconcileEvent};

/// The outcome of one pass over one asset, surfaced to metrics and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The asset's dependency kind isn't installed on this cluster; nothing was rendered.
    DependencyMissing,
    /// `reconcile-paused` was set (by an operator, or previously by the thrash detector).
    Paused,
    /// The live object already matches the rendered manifest.
    InSync,
    /// Drift was observed but `mode: observe` means it was only reported.
    ObservedOnly,
    /// Drift was corrected with a write.
    Corrected,
    /// A write was attempted but the token bucket was empty.
    Throttled,
    /// Enough consecutive throttles tipped the thrash detector into a sticky pause.
    ThrashPaused,
}

/// The shared, per-operator state threaded through every reconcile of every object — the three
/// concurrently-accessed maps plus the schema cache.
pub struct ReconcilerState {
    pub schema_probe: SchemaProbe,
    pub bucket: TokenBucket,
    /// A separate, unlimited bucket for the reconciler's own pause-annotation write (design
    /// ledger Open Question #1): it must never itself be throttled by the object's write budget.
    pub pause_bucket: TokenBucket,
    pub thrash: ThrashDetector,
}

impl ReconcilerState {
    pub fn new(bucket_capacity: u32, bucket_window: Duration, thrash_threshold: u32, schema_ttl: Duration) -> Self {
        Self {
            schema_probe: SchemaProbe::new(schema_ttl),
            bucket: TokenBucket::new(bucket_capacity, bucket_window),
            pause_bucket: TokenBucket::unlimited(),
            thrash: ThrashDetector::new(thrash_threshold),
        }
    }
}

/// Everything one call to [`reconcile_asset`] needs.
pub struct ReconcilerContext<'a> {
    pub state: &'a ReconcilerState,
    pub backend: Arc<dyn ObjectBackend>,
    pub events: Option<&'a EventPublisher>,
}

/// Runs the full algorithm for one catalog asset against one rendered target:
///
/// 1. Check the schema probe; bail out with [`ReconcileOutcome::DependencyMissing`] if the asset's
///    dependency kind isn't installed.
/// 2. Parse and validate the live object's override annotations.
/// 3. Honor a sticky `reconcile-paused` (either operator-set or thrash-set).
/// 4. Render the asset, then apply the `patch` override and mask `ignore-fields`.
/// 5. Dry-run apply and compare against live state.
/// 6. In `observe` mode, or if in sync, stop without writing.
/// 7. Otherwise apply through the token bucket; on throttle, feed the thrash detector and, if it
///    just crossed threshold, write the sticky pause annotation through the unlimited bucket.
pub async fn reconcile_asset(
    ctx: &ReconcilerContext<'_>,
    asset: &Asset,
    key: &ResourceKey,
    render_ctx: &RenderContext,
    live_annotations: &BTreeMap<String, String>,
) -> Result<ReconcileOutcome> {
    if let Some(dependency) = asset.requires {
        let plural = platform_core::schema_probe::plural_name(dependency);
        let presence = resolve_presence(ctx, &asset.gvk, &plural).await?;
        if presence == Presence::Missing {
            emit(ctx, key, ReconcileEvent::SchemaMissing, None).await;
            return Ok(ReconcileOutcome::DependencyMissing);
        }
    }

    let overrides = Overrides::from_annotations(live_annotations).map_err(Error::Core)?;

    if overrides.reconcile_paused || ctx.state.thrash.is_paused(key) {
        return Ok(ReconcileOutcome::Paused);
    }

    let mut desired = asset.render(render_ctx);
    override_engine::apply_patch(&mut desired, &overrides, &asset.gvk.kind).map_err(Error::Core)?;
    if overrides.patch.is_some() {
        emit(ctx, key, ReconcileEvent::PatchApplied, None).await;
    }
    if !overrides.ignore_fields.is_empty() {
        emit(ctx, key, ReconcileEvent::FieldsIgnored, Some(overrides.ignore_fields.join(","))).await;
    }

    let desired_value = desired.into_value();
    let drift = drift::detect(ctx.backend.as_ref(), key, &desired_value, &overrides.ignore_fields).await?;

    let DriftResult::Drifted { .. } = drift else {
        return Ok(ReconcileOutcome::InSync);
    };
    emit(ctx, key, ReconcileEvent::DriftDetected, None).await;

    if overrides.mode == InstallMode::Observe {
        emit(ctx, key, ReconcileEvent::ObserveModeSkip, None).await;
        return Ok(ReconcileOutcome::ObservedOnly);
    }

    if !ctx.state.bucket.try_acquire(key) {
        emit(ctx, key, ReconcileEvent::Throttled, None).await;
        if ctx.state.thrash.record_throttle(key) {
            emit(ctx, key, ReconcileEvent::ThrashDetected, None).await;
            write_pause_annotation(ctx, key).await?;
            return Ok(ReconcileOutcome::ThrashPaused);
        }
        return Ok(ReconcileOutcome::Throttled);
    }

    let stamped = stamp_adoption_label(&desired_value);
    ctx.backend.apply(key, &stamped).await?;
    ctx.state.thrash.record_success(key);
    emit(ctx, key, ReconcileEvent::DriftCorrected, None).await;
    Ok(ReconcileOutcome::Corrected)
}

async fn resolve_presence(ctx: &ReconcilerContext<'_>, gvk: &Gvk, plural: &str) -> Result<Presence> {
    if let Some(presence) = ctx.state.schema_probe.lookup(gvk) {
        return Ok(presence);
    }
    let supported = ctx.backend.kind_supported(gvk, plural).await?;
    let presence = if supported { Presence::Supported } else { Presence::Missing };
    ctx.state.schema_probe.record(gvk.clone(), presence);
    Ok(presence)
}

/// Writes `reconcile-paused: "true"` back onto the object through the unlimited pause bucket, so
/// the write is never itself dropped by the exhausted object-write bucket that caused the pause.
async fn write_pause_annotation(ctx: &ReconcilerContext<'_>, key: &ResourceKey) -> Result<()> {
    if !ctx.state.pause_bucket.try_acquire(key) {
        // Unreachable in practice (capacity is u32::MAX) but keep the contract honest.
        return Err(Error::Throttled(key.clone()));
    }
    let merge = serde_json::json!({
        "metadata": {
            "annotations": { RECONCILE_PAUSED: "true" }
        }
    });
    ctx.backend.apply(key, &merge).await?;
    emit(ctx, key, ReconcileEvent::ReconcilePaused, None).await;
    Ok(())
}

async fn emit(ctx: &ReconcilerContext<'_>, key: &ResourceKey, event: ReconcileEvent, note: Option<String>) {
    if let Some(publisher) = ctx.events {
        if let Err(e) = publisher.publish(key, event, note).await {
            tracing::warn!(error = %e, %key, "failed to publish event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use platform_core::renderer::DeschedulerSchemaVersion;
    use serde_json::json;
    use std::collections::HashMap;

    struct FakeBackend {
        live: parking_lot::Mutex<HashMap<String, Value>>,
        supported: bool,
    }

    #[async_trait]
    impl ObjectBackend for FakeBackend {
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
        async fn kind_supported(&self, _gvk: &Gvk, _plural: &str) -> Result<bool> {
            Ok(self.supported)
        }
    }

    fn render_ctx() -> RenderContext {
        RenderContext {
            platform_name: "demo".into(),
            namespace: "virt-platform".into(),
            eviction_limit: 5,
            parallel_migrations_per_node: 2,
            descheduler_schema: DeschedulerSchemaVersion::C,
            back_compat: false,
        }
    }

    fn config_map_asset() -> Asset {
        platform_core::catalog::assets().into_iter().find(|a| a.id == "migration-config").unwrap()
    }

    #[tokio::test]
    async fn first_reconcile_of_missing_object_corrects_drift() {
        let backend = Arc::new(FakeBackend { live: parking_lot::Mutex::new(HashMap::new()), supported: true });
        let state = ReconcilerState::new(5, Duration::from_secs(60), 3, Duration::from_secs(30));
        let ctx = ReconcilerContext { state: &state, backend: backend.clone(), events: None };
        let asset = config_map_asset();
        let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "demo-migration-config");

        let outcome = reconcile_asset(&ctx, &asset, &key, &render_ctx(), &BTreeMap::new()).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Corrected);
        assert!(backend.live.lock().contains_key(&key.to_string()));
    }

    #[tokio::test]
    async fn second_reconcile_is_in_sync() {
        let backend = Arc::new(FakeBackend { live: parking_lot::Mutex::new(HashMap::new()), supported: true });
        let state = ReconcilerState::new(5, Duration::from_secs(60), 3, Duration::from_secs(30));
        let ctx = ReconcilerContext { state: &state, backend: backend.clone(), events: None };
        let asset = config_map_asset();
        let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "demo-migration-config");

        reconcile_asset(&ctx, &asset, &key, &render_ctx(), &BTreeMap::new()).await.unwrap();
        let outcome = reconcile_asset(&ctx, &asset, &key, &render_ctx(), &BTreeMap::new()).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::InSync);
    }

    #[tokio::test]
    async fn missing_dependency_skips_rendering() {
        let backend = Arc::new(FakeBackend { live: parking_lot::Mutex::new(HashMap::new()), supported: false });
        let state = ReconcilerState::new(5, Duration::from_secs(60), 3, Duration::from_secs(30));
        let ctx = ReconcilerContext { state: &state, backend, events: None };
        let descheduler = platform_core::catalog::assets().into_iter().find(|a| a.id == "kube-descheduler").unwrap();
        let key = ResourceKey::new(descheduler.gvk.clone(), Some("virt-platform".into()), "demo-descheduler");

        let outcome = reconcile_asset(&ctx, &descheduler, &key, &render_ctx(), &BTreeMap::new()).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::DependencyMissing);
    }

    #[tokio::test]
    async fn reconcile_paused_annotation_short_circuits() {
        let backend = Arc::new(FakeBackend { live: parking_lot::Mutex::new(HashMap::new()), supported: true });
        let state = ReconcilerState::new(5, Duration::from_secs(60), 3, Duration::from_secs(30));
        let ctx = ReconcilerContext { state: &state, backend, events: None };
        let asset = config_map_asset();
        let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "demo-migration-config");

        let mut annotations = BTreeMap::new();
        annotations.insert(RECONCILE_PAUSED.to_string(), "true".to_string());
        let outcome = reconcile_asset(&ctx, &asset, &key, &render_ctx(), &annotations).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Paused);
    }

    #[tokio::test]
    async fn observe_mode_reports_without_writing() {
        let backend = Arc::new(FakeBackend { live: parking_lot::Mutex::new(HashMap::new()), supported: true });
        let state = ReconcilerState::new(5, Duration::from_secs(60), 3, Duration::from_secs(30));
        let ctx = ReconcilerContext { state: &state, backend: backend.clone(), events: None };
        let asset = config_map_asset();
        let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "demo-migration-config");

        let mut annotations = BTreeMap::new();
        annotations.insert("virt-platform.io/mode".to_string(), "observe".to_string());
        let outcome = reconcile_asset(&ctx, &asset, &key, &render_ctx(), &annotations).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::ObservedOnly);
        assert!(!backend.live.lock().contains_key(&key.to_string()));
    }

    #[tokio::test]
    async fn exhausted_bucket_throttles_then_thrash_pauses() {
        let backend = Arc::new(FakeBackend { live: parking_lot::Mutex::new(HashMap::new()), supported: true });
        let state = ReconcilerState::new(0, Duration::from_secs(60), 2, Duration::from_secs(30));
        let ctx = ReconcilerContext { state: &state, backend: backend.clone(), events: None };
        let asset = config_map_asset();
        let key = ResourceKey::new(asset.gvk.clone(), Some("virt-platform".into()), "demo-migration-config");

        let first = reconcile_asset(&ctx, &asset, &key, &render_ctx(), &BTreeMap::new()).await.unwrap();
        assert_eq!(first, ReconcileOutcome::Throttled);
        let second = reconcile_asset(&ctx, &asset, &key, &render_ctx(), &BTreeMap::new()).await.unwrap();
        assert_eq!(second, ReconcileOutcome::ThrashPaused);

        let live = backend.live.lock().get(&key.to_string()).cloned().unwrap();
        assert_eq!(live["metadata"]["annotations"][RECONCILE_PAUSED], "true");
    }
}
