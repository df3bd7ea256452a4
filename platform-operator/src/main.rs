//! Entry point: parses CLI flags, builds a cluster connection, and runs the dispatch loop
//! alongside the metrics/health HTTP server until a shutdown signal arrives.
use std::sync::Arc;

use clap::Parser;
use kube_client::config::{Kubeconfig, KubeConfigOptions};
use kube_client::{Client, Config};
use platform_operator::{cli::Cli, dispatch, http, metrics::Metrics, telemetry, DispatchContext};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    let client = match build_client(&cli).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build a Kubernetes client");
            std::process::exit(1);
        }
    };

    let metrics = Arc::new(Metrics::new());
    let ctx = Arc::new(DispatchContext::new(client, &cli, metrics.clone()));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let metrics_addr = match cli.metrics_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(addr = %cli.metrics_addr, error = %e, "invalid --metrics-addr");
            std::process::exit(1);
        }
    };

    info!(operator_id = %cli.operator_id, "starting virt-platform-operator");
    let http_task = tokio::spawn(http::serve(metrics_addr, metrics, shutdown_rx.clone()));
    let dispatch_task = tokio::spawn(dispatch::run(ctx, shutdown_rx));

    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(http_task, dispatch_task);
}

async fn build_client(cli: &Cli) -> kube_client::Result<Client> {
    let config = match &cli.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }
        None => Config::infer().await?,
    };
    Client::try_from(config)
}
