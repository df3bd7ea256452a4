#[cfg(feature = "admission")] pub mod admission;
#[cfg(feature = "cel")] pub mod cel;

pub mod api_resource;
pub use api_resource::ApiResource;

pub mod crd;
pub use crd::CustomResourceExt;

pub mod discovery;

pub mod dynamic;
pub use dynamic::DynamicObject;

pub mod duration;
pub use duration::Duration;

pub mod error_boundary;

pub mod gvk;
pub use gvk::{GroupVersionKind, GroupVersionResource};

pub mod k8s;

pub mod kubelet_debug;

pub mod labels;

pub mod metadata;

pub mod node_proxy;

pub mod object;
pub use object::ObjectList;

pub mod params;

pub mod request;
pub use request::Request;

mod resource;
pub use resource::{Resource, ResourceExt};

pub mod response;

#[cfg(feature = "schema")] pub mod schema;

pub mod scope;

pub mod subresource;

pub mod util;

pub mod version;

pub mod watch;
pub use watch::WatchEvent;

mod error;
pub use error::{Error, ErrorResponse};
pub type Result<T, E = Error> = std::result::Result<T, E>;
