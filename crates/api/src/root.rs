// SPDX-License-Identifier: Apache-2.0

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;

/// Routes for the service root descriptor.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(root))
}

#[derive(Debug, Serialize)]
struct RootResponse {
    service: &'static str,
    endpoints: &'static [&'static str],
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: "log-distributor",
        endpoints: &["/ingest", "/stats", "/health"],
    })
}
