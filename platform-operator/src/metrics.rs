//! Prometheus metrics exposed on `/metrics`, built on the same `prometheus-client` registry
//! pattern this pack's other `kube`-based operators use.
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

/// Labels identifying a single managed object across all of its time series.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ObjectLabels {
    /// Owning `Platform` object name.
    pub platform: String,
    /// Asset catalog id (e.g. `kube-descheduler`).
    pub asset: String,
    /// Namespace the asset is rendered into.
    pub namespace: String,
}

/// Labels for a customization (override patch / ignore-fields) currently in effect.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CustomizationLabels {
    /// Owning `Platform` object name.
    pub platform: String,
    /// Asset catalog id the customization applies to.
    pub asset: String,
    /// Which annotation drove the customization (`patch` or `ignore-fields`).
    pub kind: String,
}

/// Labels for a missing dependency (CRD not installed) observation.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct GvkLabels {
    /// API group of the missing kind.
    pub group: String,
    /// API version of the missing kind.
    pub version: String,
    /// Kind that is missing.
    pub kind: String,
}

/// The full set of series this operator publishes.
pub struct Metrics {
    /// Registry handed to the `/metrics` HTTP handler.
    pub registry: Registry,
    /// Whether each asset is currently in sync (1) or drifted (0).
    pub compliance_status: Family<ObjectLabels, Gauge>,
    /// Count of sticky thrash-pause transitions observed per asset.
    pub thrashing_total: Family<ObjectLabels, Counter>,
    /// Present (1) for every customization currently applied; removed entirely once cleared.
    pub customization_info: Family<CustomizationLabels, Gauge>,
    /// Set to 1 while a catalog dependency's CRD is missing from the cluster.
    pub missing_dependency: Family<GvkLabels, Gauge>,
    /// Wall-clock duration of each `reconcile_asset` call, in seconds.
    pub reconcile_duration: Family<ObjectLabels, Histogram>,
}

impl Metrics {
    /// Builds a fresh registry with every series registered under its spec-mandated name.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let compliance_status = Family::<ObjectLabels, Gauge>::default();
        registry.register(
            "compliance_status",
            "Whether a managed asset's live state matches the rendered desired state",
            compliance_status.clone(),
        );

        let thrashing_total = Family::<ObjectLabels, Counter>::default();
        registry.register(
            "thrashing_total",
            "Number of times an asset's apply rate tripped into sticky thrash-pause",
            thrashing_total.clone(),
        );

        let customization_info = Family::<CustomizationLabels, Gauge>::default();
        registry.register(
            "customization_info",
            "Present while a patch or ignore-fields override is in effect for an asset",
            customization_info.clone(),
        );

        let missing_dependency = Family::<GvkLabels, Gauge>::default();
        registry.register(
            "missing_dependency",
            "Set while a catalog asset's dependency CRD is absent from the cluster",
            missing_dependency.clone(),
        );

        let reconcile_duration =
            Family::<ObjectLabels, Histogram>::new_with_constructor(|| Histogram::new(DEFAULT_BUCKETS.iter().copied()));
        registry.register(
            "reconcile_duration_seconds",
            "Time spent reconciling a single asset",
            reconcile_duration.clone(),
        );

        Self {
            registry,
            compliance_status,
            thrashing_total,
            customization_info,
            missing_dependency,
            reconcile_duration,
        }
    }

    /// Clears a customization series. Per the mandatory-clear rule, this must be called whenever
    /// an override annotation transitions from present to absent, not just left to go stale.
    pub fn clear_customization(&self, labels: &CustomizationLabels) {
        self.customization_info.remove(labels);
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &self.registry).expect("encoding to a String cannot fail");
        buffer
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

const DEFAULT_BUCKETS: [f64; 10] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];
