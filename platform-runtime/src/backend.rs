//! The single seam between the reconciler and a real cluster, so integration tests can swap in
//! an in-memory double instead of standing up an apiserver.
use async_trait::async_trait;
use kube_client::{
    api::{ApiResource, DynamicObject, Patch, PatchParams},
    Api, Client,
};
use platform_core::gvk::{Gvk, ResourceKey};
use serde_json::Value;

use crate::error::{Error, Result};

const FIELD_MANAGER: &str = "virt-platform-operator";

/// Everything the reconciler needs from a cluster connection.
///
/// Mirrors the subset of `Api<DynamicObject>` the applier and drift detector actually use, kept
/// narrow so [`FakeBackend`] (see `tests/`) can implement it without a real client.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Fetches the live object, or `None` if it doesn't exist yet.
    async fn get(&self, key: &ResourceKey) -> Result<Option<Value>>;

    /// Performs a force server-side-apply dry run and returns what the server *would* store,
    /// without persisting it.
    async fn dry_run_apply(&self, key: &ResourceKey, desired: &Value) -> Result<Value>;

    /// Performs a real force server-side-apply and returns the object as the server stored it.
    async fn apply(&self, key: &ResourceKey, desired: &Value) -> Result<Value>;

    /// Checks whether the given kind's API is currently discoverable on the cluster.
    async fn kind_supported(&self, gvk: &Gvk, plural: &str) -> Result<bool>;
}

/// The real backend, built on `kube_client::Api<DynamicObject>`.
pub struct KubeBackend {
    client: Client,
}

impl KubeBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api_for(&self, key: &ResourceKey, plural: &str) -> Api<DynamicObject> {
        let resource = ApiResource::from_gvk_with_plural(
            &kube_core::gvk::GroupVersionKind::gvk(&key.gvk.group, &key.gvk.version, &key.gvk.kind),
            plural,
        );
        match &key.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        }
    }

    fn plural_for(&self, gvk: &Gvk) -> String {
        platform_core::schema_probe::plural_name(&gvk.kind)
    }
}

#[async_trait]
impl ObjectBackend for KubeBackend {
    async fn get(&self, key: &ResourceKey) -> Result<Option<Value>> {
        let plural = self.plural_for(&key.gvk);
        let api = self.api_for(key, &plural);
        match api.get_opt(&key.name).await {
            Ok(Some(obj)) => Ok(Some(serde_json::to_value(obj).expect("DynamicObject always serializes"))),
            Ok(None) => Ok(None),
            Err(e) => Err(Error::SchemaLookup(key.clone(), e)),
        }
    }

    async fn dry_run_apply(&self, key: &ResourceKey, desired: &Value) -> Result<Value> {
        let plural = self.plural_for(&key.gvk);
        let api = self.api_for(key, &plural);
        let pp = PatchParams::apply(FIELD_MANAGER).force().dry_run();
        let patch = Patch::Apply(desired);
        let obj = api.patch(&key.name, &pp, &patch).await.map_err(|e| Error::DryRun(key.clone(), e))?;
        Ok(serde_json::to_value(obj).expect("DynamicObject always serializes"))
    }

    async fn apply(&self, key: &ResourceKey, desired: &Value) -> Result<Value> {
        let plural = self.plural_for(&key.gvk);
        let api = self.api_for(key, &plural);
        let pp = PatchParams::apply(FIELD_MANAGER).force();
        let patch = Patch::Apply(desired);
        let obj = api.patch(&key.name, &pp, &patch).await.map_err(|e| Error::Apply(key.clone(), e))?;
        Ok(serde_json::to_value(obj).expect("DynamicObject always serializes"))
    }

    async fn kind_supported(&self, gvk: &Gvk, _plural: &str) -> Result<bool> {
        let resources = self
            .client
            .list_api_group_resources(&gvk.api_version())
            .await
            .map_err(|e| Error::SchemaLookup(ResourceKey::new(gvk.clone(), None, "<discovery>"), e))?;
        Ok(resources.resources.iter().any(|r| r.kind == gvk.kind))
    }
}
