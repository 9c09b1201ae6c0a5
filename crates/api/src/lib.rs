// SPDX-License-Identifier: Apache-2.0

//! HTTP ingestion and observability surface for the log-packet distributor.
//!
//! Combines the `/ingest`, `/stats`, `/health`, and `/` routes into a single
//! axum router over shared [`distributor_core`] state, and runs that router
//! to completion with graceful shutdown wired to a [`CancellationToken`].

pub mod error;
pub mod health;
pub mod ingest;
pub mod root;
pub mod stats;

use std::sync::Arc;

use axum::Router;
use distributor_core::{AnalyzerRegistry, Queue};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Analyzer registry and stats.
    pub registry: Arc<AnalyzerRegistry>,
    /// Ingress queue handlers enqueue accepted packets onto.
    pub queue: Queue,
    /// Configured queue capacity, surfaced in `/health` as `queue_utilization`.
    pub queue_capacity: usize,
}

/// Builds the merged router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(root::routes())
        .merge(ingest::routes())
        .merge(stats::routes())
        .merge(health::routes())
        .with_state(state)
}

/// Binds `bind_address` and serves `router` until `cancel` fires, at which
/// point axum stops accepting new connections and waits for in-flight
/// requests to finish.
pub async fn serve(
    bind_address: &str,
    router: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!(bind_address, "ingress server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}
