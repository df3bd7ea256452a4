//! The `/metrics`, `/healthz`, `/readyz` HTTP surface every controller in this ecosystem exposes,
//! built directly on `hyper`+`hyper-util` (already vendored transitively via `kube-client`)
//! rather than pulling in a full web framework for three routes.
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::metrics::Metrics;

async fn handle(req: Request<Incoming>, metrics: Arc<Metrics>) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match req.uri().path() {
        "/metrics" => Response::builder()
            .header("content-type", "application/openmetrics-text; version=1.0.0; charset=utf-8")
            .body(Full::new(Bytes::from(metrics.encode())))
            .expect("static response is well-formed"),
        "/healthz" | "/readyz" => Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from_static(b"ok")))
            .expect("static response is well-formed"),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::new()))
            .expect("static response is well-formed"),
    };
    Ok(response)
}

/// Serves `/metrics`, `/healthz`, and `/readyz` on `addr` until `shutdown` fires.
pub async fn serve(addr: SocketAddr, metrics: Arc<Metrics>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind metrics listener");
            return;
        }
    };
    info!(%addr, "metrics server listening");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
            accepted = listener.accept() => {
                let Ok((stream, _)) = accepted else { continue };
                let metrics = metrics.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| handle(req, metrics.clone()));
                    if let Err(e) = hyper::server::conn::http1::Builder::new().serve_connection(io, service).await {
                        error!(error = %e, "metrics connection error");
                    }
                });
            }
        }
    }
}
