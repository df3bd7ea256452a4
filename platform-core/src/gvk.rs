//! Group/version/kind identity and the per-object key used throughout the engine.
use std::fmt;

/// A group/version/kind triple, analogous to `kube_core::gvk::GroupVersionKind` but owned and
/// comparable/hashable so it can key the schema cache and the asset catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { group: group.into(), version: version.into(), kind: kind.into() }
    }

    /// `apiVersion` as it appears on the wire: `group/version`, or bare `version` for core.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

/// Identifies a single managed object: its kind plus namespace/name.
///
/// Used as the map key for the token bucket and thrash detector, so two objects of different
/// kinds sharing a name never collide, and reconciles of the same object always serialize through
/// the same bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub gvk: Gvk,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceKey {
    pub fn new(gvk: Gvk, namespace: Option<String>, name: impl Into<String>) -> Self {
        Self { gvk, namespace, name: name.into() }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.gvk, ns, self.name),
            None => write!(f, "{}/{}", self.gvk, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_omits_group_for_core() {
        let gvk = Gvk::new("", "v1", "ConfigMap");
        assert_eq!(gvk.api_version(), "v1");
        assert_eq!(gvk.to_string(), "v1/ConfigMap");
    }

    #[test]
    fn api_version_includes_group() {
        let gvk = Gvk::new("apps", "v1", "Deployment");
        assert_eq!(gvk.api_version(), "apps/v1");
    }

    #[test]
    fn resource_key_display_namespaced_vs_cluster_scoped() {
        let gvk = Gvk::new("apps", "v1", "Deployment");
        let key = ResourceKey::new(gvk.clone(), Some("default".into()), "web");
        assert_eq!(key.to_string(), "apps/v1/Deployment/default/web");

        let cluster_key = ResourceKey::new(gvk, None, "web");
        assert_eq!(cluster_key.to_string(), "apps/v1/Deployment/web");
    }

    #[test]
    fn distinct_kinds_with_same_name_are_distinct_keys() {
        let a = ResourceKey::new(Gvk::new("apps", "v1", "Deployment"), Some("ns".into()), "foo");
        let b = ResourceKey::new(Gvk::new("batch", "v1", "Job"), Some("ns".into()), "foo");
        assert_ne!(a, b);
    }
}
