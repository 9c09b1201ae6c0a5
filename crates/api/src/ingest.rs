// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use distributor_core::LogPacket;
use serde::Serialize;

use crate::error::Error;
use crate::AppState;

/// Routes for accepting batched log payloads.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ingest", post(ingest))
}

/// Acknowledgement body returned on `202 Accepted`. The service returns this
/// before downstream delivery is attempted; acceptance here means only that
/// the packet reached the ingress queue, not that any analyzer received it.
#[derive(Debug, Serialize)]
struct IngestAck {
    status: &'static str,
    packet_id: String,
    message: &'static str,
}

async fn ingest(
    State(state): State<AppState>,
    Json(packet): Json<LogPacket>,
) -> Result<(StatusCode, Json<IngestAck>), Error> {
    packet
        .validate()
        .map_err(|err| Error::InvalidPacket(err.to_string()))?;

    let message_count = packet.message_count();
    let packet_id = packet.packet_id.clone();
    match state.queue.offer(packet) {
        Ok(()) => {
            state.registry.record_received(message_count);
            Ok((
                StatusCode::ACCEPTED,
                Json(IngestAck {
                    status: "accepted",
                    packet_id,
                    message: "packet queued for delivery",
                }),
            ))
        }
        Err(_rejected) => {
            state.registry.record_queue_rejected();
            Err(Error::QueueFull)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use distributor_core::AnalyzerRegistry;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(capacity: usize) -> AppState {
        AppState {
            registry: Arc::new(AnalyzerRegistry::new(vec![])),
            queue: distributor_core::Queue::bounded(capacity),
            queue_capacity: capacity,
        }
    }

    fn valid_body() -> &'static str {
        r#"{"packet_id":"p1","agent_id":"a1","messages":[{"source":"svc","timestamp":"2026-07-27T00:00:00Z","level":"INFO","message":"hi"}]}"#
    }

    #[tokio::test]
    async fn empty_messages_is_rejected_with_422() {
        let app = crate::router(state(10));
        let response = app
            .oneshot(
                Request::post("/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"packet_id":"p1","agent_id":"a1","messages":[]}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_packet_id_is_rejected_with_422() {
        let app = crate::router(state(10));
        let body = r#"{"packet_id":"","agent_id":"a1","messages":[{"source":"svc","timestamp":"2026-07-27T00:00:00Z","level":"INFO","message":"hi"}]}"#;
        let response = app
            .oneshot(
                Request::post("/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn packet_with_invalid_level_is_rejected_with_422() {
        let app = crate::router(state(10));
        let body = r#"{"packet_id":"p1","agent_id":"a1","messages":[{"source":"svc","timestamp":"2026-07-27T00:00:00Z","level":"VERBOSE","message":"hi"}]}"#;
        let response = app
            .oneshot(
                Request::post("/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn packet_with_invalid_timestamp_is_rejected_with_422() {
        let app = crate::router(state(10));
        let body = r#"{"packet_id":"p1","agent_id":"a1","messages":[{"source":"svc","timestamp":"not-a-timestamp","level":"INFO","message":"hi"}]}"#;
        let response = app
            .oneshot(
                Request::post("/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn valid_packet_is_accepted_with_202() {
        let app = crate::router(state(10));
        let response = app
            .oneshot(
                Request::post("/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from(valid_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn full_queue_is_rejected_with_503() {
        let app_state = state(1);
        app_state
            .queue
            .offer(serde_json::from_str(valid_body()).unwrap())
            .unwrap();

        let app = crate::router(app_state);
        let response = app
            .oneshot(
                Request::post("/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from(valid_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
