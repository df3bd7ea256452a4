//! Runtime machinery for building Kubernetes controllers
#![deny(clippy::all)]
#![allow(clippy::pub_enum_variant_names)]
#![allow(clippy::default_trait_access)]

pub mod controller;
pub mod events;
pub mod finalizer;
pub mod metrics;
pub mod predicate;
pub mod reflector;
pub mod scheduler;
pub mod utils;
pub mod wait;
pub mod watcher;

#[cfg(feature = "unstable-runtime-subscribe")]
pub mod cache;
#[cfg(feature = "unstable-runtime-subscribe")]
pub mod shared_store;

pub mod coordination;
pub mod indexer;
pub mod lease;
pub mod lock;
pub mod observer;
pub mod raw_json;

pub use controller::{Action, Controller};
pub use reflector::reflector;
pub use scheduler::scheduler;
pub use watcher::watcher;
