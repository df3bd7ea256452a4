//! The fixed set of assets this operator knows how to render and reconcile.
//!
//! Each [`Asset`] pairs a [`Gvk`] with the dependency it needs present on the cluster (if any) and
//! a render function. The catalog is ordered: [`Catalog::assets`] returns assets in ascending
//! dependency order, matching `kube_runtime::controller`'s own ascending-order trigger dispatch,
//! so e.g. a `Namespace` always renders before anything that lives inside it.
use crate::gvk::Gvk;
use crate::renderer::{self, RenderContext};
use crate::tree::DynTree;

/// One entry in the catalog.
pub struct Asset {
    /// Stable identifier, used in logs/events and as part of the adoption name.
    pub id: &'static str,
    pub gvk: Gvk,
    /// The kind whose presence on the cluster gates rendering this asset, if any.
    ///
    /// `None` means the asset is always rendered (e.g. built-in core/v1 kinds the operator
    /// assumes every cluster has).
    pub requires: Option<&'static str>,
    render: fn(&RenderContext) -> DynTree,
}

impl Asset {
    /// Renders this asset's manifest against `ctx`.
    pub fn render(&self, ctx: &RenderContext) -> DynTree {
        (self.render)(ctx)
    }
}

/// Returns the built-in catalog in dependency order.
pub fn assets() -> Vec<Asset> {
    vec![
        Asset {
            id: "migration-config",
            gvk: Gvk::new("", "v1", "ConfigMap"),
            requires: None,
            render: renderer::render_migration_config,
        },
        Asset {
            id: "kube-descheduler",
            gvk: Gvk::new("descheduler.io", "v1alpha1", "KubeDescheduler"),
            requires: Some("KubeDescheduler"),
            render: renderer::render_kube_descheduler,
        },
    ]
}
