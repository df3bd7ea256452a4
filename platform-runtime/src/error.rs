//! I/O-carrying error taxonomy. [`platform_core::Error`] covers everything that doesn't touch the
//! network; this extends it with the calls that do.
use platform_core::gvk::ResourceKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] platform_core::Error),

    #[error("schema lookup for {0} failed: {1}")]
    SchemaLookup(ResourceKey, #[source] kube_client::Error),

    #[error("dry-run apply for {0} failed: {1}")]
    DryRun(ResourceKey, #[source] kube_client::Error),

    #[error("apply for {0} failed: {1}")]
    Apply(ResourceKey, #[source] kube_client::Error),

    #[error("{0} is throttled; write deferred")]
    Throttled(ResourceKey),

    #[error("{0} is paused by the thrash detector")]
    Paused(ResourceKey),

    #[error("event publish for {0} failed: {1}")]
    EventPublish(ResourceKey, #[source] kube_client::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
