// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Routes exposing lifetime delivery counters.
pub fn routes() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

/// Response body for `GET /stats`, matching the data model's `Stats` record
/// field for field.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
struct StatsResponse {
    total_packets_accepted: u64,
    total_messages_accepted: u64,
    failed_sends: u64,
    per_analyzer_packets: BTreeMap<String, u64>,
    per_analyzer_messages: BTreeMap<String, u64>,
    start_time: DateTime<Utc>,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.registry.stats();
    Json(StatsResponse {
        total_packets_accepted: stats.total_packets_accepted,
        total_messages_accepted: stats.total_messages_accepted,
        failed_sends: stats.failed_sends,
        per_analyzer_packets: stats.per_analyzer_packets,
        per_analyzer_messages: stats.per_analyzer_messages,
        start_time: stats.start_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use distributor_config::AnalyzerConfig;
    use distributor_core::AnalyzerRegistry;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn stats_reflects_registry_counters() {
        let registry = Arc::new(AnalyzerRegistry::new(vec![AnalyzerConfig {
            name: "a".to_string(),
            url: "http://localhost/a/ingest".to_string(),
            weight: 1.0,
            health_url: None,
        }]));
        registry.record_success("a", 4);
        registry.record_failed_send();
        let state = AppState {
            registry,
            queue: distributor_core::Queue::bounded(10),
            queue_capacity: 10,
        };

        let app = crate::router(state);
        let response = app
            .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: StatsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.total_packets_accepted, 1);
        assert_eq!(parsed.total_messages_accepted, 4);
        assert_eq!(parsed.failed_sends, 1);
        assert_eq!(parsed.per_analyzer_packets.get("a"), Some(&1));
    }
}
