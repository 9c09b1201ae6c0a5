// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors the HTTP surface can return to a client, mapped to the status
/// codes described for `/ingest` in the service's interface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body was not valid JSON, or decoded to an empty packet.
    #[error("invalid log packet: {0}")]
    InvalidPacket(String),

    /// The ingress queue is at capacity.
    #[error("queue is full")]
    QueueFull,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidPacket(reason) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": reason }))).into_response()
            }
            Error::QueueFull => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": self.to_string(),
                    "retry_after_seconds": 1,
                })),
            )
                .into_response(),
        }
    }
}
