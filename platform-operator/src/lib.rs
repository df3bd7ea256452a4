//! Reconciles the `Platform` custom resource against the built-in asset catalog.
pub mod cli;
pub mod dispatch;
pub mod http;
pub mod metrics;
pub mod platform_spec;
pub mod telemetry;

pub use cli::Cli;
pub use dispatch::DispatchContext;
pub use metrics::Metrics;
