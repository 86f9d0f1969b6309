//! Liveness responder for hosts that only keep processes alive while they answer HTTP.
//! Shares nothing with the watcher.

use std::net::SocketAddr;

use anyhow::Context;
use axum::{http::StatusCode, Router};
use tower_http::trace::TraceLayer;

use crate::metrics::Metrics;

/// `200 OK` for every method and path. `/metrics` is routed when a recorder is installed.
pub fn router(metrics: Option<&Metrics>) -> Router {
    let base = match metrics {
        Some(m) => m.router(),
        None => Router::new(),
    };
    base.fallback(alive).layer(TraceLayer::new_for_http())
}

async fn alive() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Serve `router` on `0.0.0.0:port` until the process is killed.
pub async fn serve(port: u16, router: Router) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding liveness listener on {addr}"))?;
    tracing::info!(target: "api", %addr, "liveness endpoint listening");
    axum::serve(listener, router)
        .await
        .context("liveness server stopped")
}
