//! The `PlatformSpec` custom resource: one instance per cluster, configuring the live-migration
//! behavior the asset catalog renders against.
use kube_derive::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_eviction_limit() -> u32 {
    5
}

fn default_parallel_migrations_per_node() -> u32 {
    2
}

/// Live-migration tuning knobs, rendered into the `KubeDescheduler` asset and the migration
/// config map.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct LiveMigrationSpec {
    /// Maximum number of VMs the descheduler may evict concurrently cluster-wide.
    #[serde(default = "default_eviction_limit")]
    pub eviction_limit: u32,
    /// Maximum number of concurrent migrations targeting a single node.
    #[serde(default = "default_parallel_migrations_per_node")]
    pub parallel_migrations_per_node: u32,
}

impl Default for LiveMigrationSpec {
    fn default() -> Self {
        Self {
            eviction_limit: default_eviction_limit(),
            parallel_migrations_per_node: default_parallel_migrations_per_node(),
        }
    }
}

/// The spec half of the `Platform` custom resource this operator watches.
#[derive(CustomResource, Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "virt-platform.io",
    version = "v1alpha1",
    kind = "Platform",
    plural = "platforms",
    singular = "platform",
    namespaced,
    status = "PlatformStatus",
    derive = "Default"
)]
pub struct PlatformSpecInner {
    #[serde(default)]
    pub live_migration: LiveMigrationSpec,
}

/// Reported back onto the `Platform` object by the reconciler.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct PlatformStatus {
    pub conditions: Vec<PlatformCondition>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct PlatformCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
}
