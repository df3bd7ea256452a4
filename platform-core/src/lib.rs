//! Client-less reconciliation primitives.
//!
//! Everything in this crate operates on plain data — [`tree::DynTree`], annotations, and cached
//! schema facts — with no Kubernetes client in sight. `platform-runtime` is the layer that wires
//! these primitives to a real `Api<DynamicObject>`.

pub mod annotations;
pub mod catalog;
pub mod error;
pub mod gvk;
pub mod override_engine;
pub mod renderer;
pub mod schema_probe;
pub mod thrash;
pub mod token_bucket;
pub mod tree;

pub use error::{Error, Result};
pub use gvk::{Gvk, ResourceKey};
pub use tree::DynTree;
