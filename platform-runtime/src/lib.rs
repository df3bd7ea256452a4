//! Wires `platform-core`'s pure logic to a real Kubernetes cluster via `kube-client`.
pub mod applier;
pub mod backend;
pub mod drift;
pub mod error;
pub mod events;
pub mod reconciler;

pub use backend::{KubeBackend, ObjectBackend};
pub use error::{Error, Result};
pub use reconciler::{reconcile_asset, ReconcilerContext, ReconcilerState};
