//! Wires up `tracing` output. Format is picked by [`crate::cli::LogFormat`]; verbosity by
//! `RUST_LOG`, falling back to `info` for this crate and its dependents.
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogFormat;

/// Installs the global `tracing` subscriber. Must be called once, before any reconcile work.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
