//! Command-line flags, all overridable via `VIRT_PLATFORM_`-prefixed environment variables.
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Log output format for the tracing subscriber.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored when attached to a terminal.
    Text,
    /// Newline-delimited JSON, for log aggregators.
    Json,
}

/// Top-level configuration for the `virt-platform-operator` binary.
#[derive(Parser, Debug)]
#[command(name = "virt-platform-operator", version, about)]
pub struct Cli {
    /// Field manager / event reporting identity used against the apiserver.
    #[arg(long, env = "VIRT_PLATFORM_OPERATOR_ID", default_value = "virt-platform-operator")]
    pub operator_id: String,

    /// Address the Prometheus metrics and health endpoints bind to.
    #[arg(long, env = "VIRT_PLATFORM_METRICS_ADDR", default_value = "0.0.0.0:8080")]
    pub metrics_addr: String,

    /// Number of `Platform` objects reconciled concurrently.
    #[arg(long, env = "VIRT_PLATFORM_WORKER_CONCURRENCY", default_value_t = 10)]
    pub worker_concurrency: usize,

    /// Token-bucket capacity per resource key.
    #[arg(long, env = "VIRT_PLATFORM_BUCKET_CAPACITY", default_value_t = 5)]
    pub bucket_capacity: u32,

    /// Token-bucket refill window, in seconds.
    #[arg(long, env = "VIRT_PLATFORM_BUCKET_WINDOW_SECS", default_value_t = 60)]
    pub bucket_window_secs: u64,

    /// Consecutive throttles before a resource key is put into sticky thrash-pause.
    #[arg(long, env = "VIRT_PLATFORM_THRASH_THRESHOLD", default_value_t = 3)]
    pub thrash_threshold: u32,

    /// How long a CRD-presence probe result is trusted before being re-checked.
    #[arg(long, env = "VIRT_PLATFORM_SCHEMA_TTL_SECS", default_value_t = 30)]
    pub schema_ttl_secs: u64,

    /// Log output format.
    #[arg(long, env = "VIRT_PLATFORM_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Path to a kubeconfig file. Unset falls back to in-cluster config, then `~/.kube/config`.
    #[arg(long, env = "VIRT_PLATFORM_KUBECONFIG")]
    pub kubeconfig: Option<String>,
}

impl Cli {
    /// The token-bucket refill window as a [`Duration`].
    pub fn bucket_window(&self) -> Duration {
        Duration::from_secs(self.bucket_window_secs)
    }

    /// The schema-presence cache TTL as a [`Duration`].
    pub fn schema_ttl(&self) -> Duration {
        Duration::from_secs(self.schema_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::parse_from(["virt-platform-operator"]);
        assert_eq!(cli.operator_id, "virt-platform-operator");
        assert_eq!(cli.worker_concurrency, 10);
        assert_eq!(cli.bucket_capacity, 5);
        assert_eq!(cli.bucket_window_secs, 60);
        assert_eq!(cli.thrash_threshold, 3);
        assert_eq!(cli.schema_ttl_secs, 30);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from(["virt-platform-operator", "--worker-concurrency", "25", "--thrash-threshold", "1"]);
        assert_eq!(cli.worker_concurrency, 25);
        assert_eq!(cli.thrash_threshold, 1);
    }
}
