//! Conditional template expansion: turns a [`RenderContext`] plus an asset definition into a
//! concrete manifest tree.
use serde_json::json;

use crate::tree::DynTree;

/// The descheduler CRD's schema has changed its profile-name enum across releases. The renderer
/// has to pick the right literal for whichever schema version is actually installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeschedulerSchemaVersion {
    /// Original schema: only `LongLifecycle` existed.
    A,
    /// Introduced a dev-only migrate-and-evict profile.
    B,
    /// Renamed the dev profile to its stable name; `C` with `back_compat` still emits the old
    /// name for clusters that haven't rolled the rename out to every node yet.
    C,
}

/// Everything the renderer needs that isn't intrinsic to the asset itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub platform_name: String,
    pub namespace: String,
    pub eviction_limit: u32,
    pub parallel_migrations_per_node: u32,
    pub descheduler_schema: DeschedulerSchemaVersion,
    /// When `true`, render the pre-rename profile name even against schema `C`.
    pub back_compat: bool,
}

impl RenderContext {
    /// Resolves which descheduler profile name to emit for the installed schema version.
    pub fn descheduler_profile_name(&self) -> &'static str {
        use DeschedulerSchemaVersion::*;
        match self.descheduler_schema {
            A => "LongLifecycle",
            B => "DevKubeVirtRelieveAndMigrate",
            C => {
                if self.back_compat {
                    "DevKubeVirtRelieveAndMigrate"
                } else {
                    "KubeVirtRelieveAndMigrate"
                }
            }
        }
    }
}

pub fn render_migration_config(ctx: &RenderContext) -> DynTree {
    DynTree::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": format!("{}-migration-config", ctx.platform_name),
            "namespace": ctx.namespace,
        },
        "data": {
            "evictionLimit": ctx.eviction_limit.to_string(),
            "parallelMigrationsPerNode": ctx.parallel_migrations_per_node.to_string(),
        }
    }))
}

pub fn render_kube_descheduler(ctx: &RenderContext) -> DynTree {
    DynTree::new(json!({
        "apiVersion": "descheduler.io/v1alpha1",
        "kind": "KubeDescheduler",
        "metadata": {
            "name": format!("{}-descheduler", ctx.platform_name),
            "namespace": ctx.namespace,
        },
        "spec": {
            "profile": ctx.descheduler_profile_name(),
            "evictionLimit": ctx.eviction_limit,
            "parallelMigrationsPerNode": ctx.parallel_migrations_per_node,
        }
    }))
}
