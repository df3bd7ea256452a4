//! Lists every `Platform` object, renders its asset catalog, and keeps reconciling it as changes
//! come in over `Api::watch`. Stands in for `kube_runtime::Controller`, which cannot be
//! constructed against this workspace's vendored `kube-runtime` snapshot (see `DESIGN.md`).
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{StreamExt, TryStreamExt};
use kube_client::api::{ListParams, ResourceExt, WatchEvent, WatchParams};
use kube_client::{Api, Client};
use platform_core::catalog;
use platform_core::gvk::ResourceKey;
use platform_core::renderer::{DeschedulerSchemaVersion, RenderContext};
use platform_runtime::reconciler::{ReconcileOutcome, ReconcilerContext, ReconcilerState};
use platform_runtime::{reconcile_asset, KubeBackend, ObjectBackend};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::cli::Cli;
use crate::metrics::{Metrics, ObjectLabels};
use crate::platform_spec::Platform;

/// Everything the dispatch loop needs beyond the CLI flags.
pub struct DispatchContext {
    /// Kube client shared across every worker.
    pub client: Client,
    /// Cross-asset reconciler state: schema cache, token buckets, thrash detectors.
    pub state: ReconcilerState,
    /// Metrics registry the workers report into.
    pub metrics: Arc<Metrics>,
    /// Backend wrapping `client` for `reconcile_asset`.
    pub backend: Arc<dyn ObjectBackend>,
    /// Caps the number of `Platform` objects reconciled concurrently.
    pub concurrency: usize,
}

impl DispatchContext {
    /// Builds reconciler state and a `KubeBackend` from the resolved CLI flags.
    pub fn new(client: Client, cli: &Cli, metrics: Arc<Metrics>) -> Self {
        let state = ReconcilerState::new(cli.bucket_capacity, cli.bucket_window(), cli.thrash_threshold, cli.schema_ttl());
        let backend: Arc<dyn ObjectBackend> = Arc::new(KubeBackend::new(client.clone()));
        Self { client, state, metrics, backend, concurrency: cli.worker_concurrency }
    }
}

/// Runs until cancelled: an initial full list, then a watch loop, re-listing whenever the watch
/// stream ends (expired resource version, connection drop, etc).
pub async fn run(ctx: Arc<DispatchContext>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let platforms: Api<Platform> = Api::all(ctx.client.clone());
    loop {
        if *shutdown.borrow() {
            return;
        }
        let resource_version = match reconcile_all(&ctx, &platforms).await {
            Ok(rv) => rv,
            Err(e) => {
                warn!(error = %e, "initial list failed, retrying in 5s");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        let wp = WatchParams::default();
        let stream = match platforms.watch(&wp, &resource_version).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "watch request failed, re-listing");
                continue;
            }
        };
        tokio::pin!(stream);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                next = stream.try_next() => {
                    match next {
                        Ok(Some(event)) => handle_event(&ctx, &platforms, event).await,
                        Ok(None) => break,
                        Err(e) => {
                            warn!(error = %e, "watch stream errored, re-listing");
                            break;
                        }
                    }
                }
            }
        }
    }
}

async fn reconcile_all(ctx: &Arc<DispatchContext>, api: &Api<Platform>) -> kube_client::Result<String> {
    let list = api.list(&ListParams::default()).await?;
    let resource_version = list.metadata.resource_version.clone().unwrap_or_default();
    let semaphore = Arc::new(Semaphore::new(ctx.concurrency.max(1)));
    let mut handles = Vec::with_capacity(list.items.len());
    for platform in list.items {
        let ctx = ctx.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
            reconcile_platform(&ctx, &platform).await;
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }
    Ok(resource_version)
}

async fn handle_event(ctx: &Arc<DispatchContext>, _api: &Api<Platform>, event: WatchEvent<Platform>) {
    match event {
        WatchEvent::Added(p) | WatchEvent::Modified(p) => reconcile_platform(ctx, &p).await,
        WatchEvent::Deleted(p) => {
            info!(platform = %p.name_any(), "Platform deleted, forgetting its reconcile state");
        }
        WatchEvent::Bookmark(_) => {}
        WatchEvent::Error(e) => warn!(error = %e, "watch reported an error event"),
    }
}

/// Reconciles every catalog asset for a single `Platform` object, in catalog order so that a
/// dependency (e.g. the `KubeDescheduler` CRD) is always attempted before whatever needs it.
#[instrument(skip(ctx, platform), fields(platform = %platform.name_any()))]
async fn reconcile_platform(ctx: &Arc<DispatchContext>, platform: &Platform) {
    let namespace = platform.namespace().unwrap_or_else(|| "default".to_string());
    let annotations = platform.annotations().clone();
    let render_ctx = RenderContext {
        platform_name: platform.name_any(),
        namespace: namespace.clone(),
        eviction_limit: platform.spec.live_migration.eviction_limit,
        parallel_migrations_per_node: platform.spec.live_migration.parallel_migrations_per_node,
        descheduler_schema: DeschedulerSchemaVersion::C,
        back_compat: false,
    };
    let reconciler_ctx = ReconcilerContext { state: &ctx.state, backend: ctx.backend.clone(), events: None };

    for asset in catalog::assets() {
        let key = ResourceKey::new(asset.gvk.clone(), Some(namespace.clone()), format!("{}-{}", render_ctx.platform_name, asset.id));
        let labels = ObjectLabels { platform: render_ctx.platform_name.clone(), asset: asset.id.to_string(), namespace: namespace.clone() };
        let started = Instant::now();
        let outcome = reconcile_asset(&reconciler_ctx, &asset, &key, &render_ctx, &annotations).await;
        ctx.metrics.reconcile_duration.get_or_create(&labels).observe(started.elapsed().as_secs_f64());
        report_outcome(ctx, &labels, &key, outcome);
    }
}

fn report_outcome(
    ctx: &Arc<DispatchContext>,
    labels: &ObjectLabels,
    key: &ResourceKey,
    outcome: platform_runtime::Result<ReconcileOutcome>,
) {
    match outcome {
        Ok(ReconcileOutcome::Corrected | ReconcileOutcome::InSync | ReconcileOutcome::ObservedOnly) => {
            ctx.metrics.compliance_status.get_or_create(labels).set(1);
        }
        Ok(ReconcileOutcome::DependencyMissing) => {
            ctx.metrics.compliance_status.get_or_create(labels).set(0);
        }
        Ok(ReconcileOutcome::Throttled) => {
            ctx.metrics.compliance_status.get_or_create(labels).set(0);
        }
        Ok(ReconcileOutcome::ThrashPaused) => {
            ctx.metrics.thrashing_total.get_or_create(labels).inc();
            ctx.metrics.compliance_status.get_or_create(labels).set(0);
        }
        Ok(ReconcileOutcome::Paused) => {
            ctx.metrics.compliance_status.get_or_create(labels).set(0);
        }
        Err(e) => {
            warn!(resource = %key, error = %e, "reconcile failed");
            ctx.metrics.compliance_status.get_or_create(labels).set(0);
        }
    }
}
