// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;

/// Routes exposing the distributor's own operational health.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Per-analyzer detail line in `/health`'s `analyzer_details`.
#[derive(Debug, Serialize)]
struct AnalyzerDetail {
    name: String,
    weight: f64,
    is_healthy: bool,
    packets_received: u64,
    messages_received: u64,
}

/// Breakdown of the analyzer pool's current health.
#[derive(Debug, Serialize)]
struct AnalyzerCounts {
    total: usize,
    healthy: usize,
    unhealthy: usize,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    queue_size: usize,
    queue_utilization: f64,
    total_packets_received: u64,
    total_messages_received: u64,
    failed_sends: u64,
    analyzers: AnalyzerCounts,
    analyzer_details: Vec<AnalyzerDetail>,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let snapshot = state.registry.snapshot();
    let ingress = state.registry.ingress_counts();
    let stats = state.registry.stats();
    let healthy = snapshot.iter().filter(|a| a.healthy).count();
    let total = snapshot.len();
    let queue_size = state.queue.len();
    let queue_utilization = if state.queue_capacity == 0 {
        0.0
    } else {
        queue_size as f64 / state.queue_capacity as f64
    };

    // Unhealthy once every analyzer is down (or none are configured);
    // otherwise healthy even with some analyzers excluded, since the
    // selector simply renormalizes over whoever remains.
    let status = if total == 0 || healthy == 0 {
        "unhealthy"
    } else if healthy < total {
        "degraded"
    } else {
        "healthy"
    };
    let status_code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let body = HealthResponse {
        status,
        queue_size,
        queue_utilization,
        total_packets_received: ingress.total_received,
        total_messages_received: ingress.total_messages_received,
        failed_sends: stats.failed_sends,
        analyzers: AnalyzerCounts {
            total,
            healthy,
            unhealthy: total - healthy,
        },
        analyzer_details: snapshot
            .into_iter()
            .map(|a| AnalyzerDetail {
                name: a.name,
                weight: a.weight,
                is_healthy: a.healthy,
                packets_received: a.packets,
                messages_received: a.messages,
            })
            .collect(),
    };

    (status_code, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use distributor_config::AnalyzerConfig;
    use distributor_core::AnalyzerRegistry;
    use std::sync::Arc;

    fn analyzer(name: &str) -> AnalyzerConfig {
        AnalyzerConfig {
            name: name.to_string(),
            url: format!("http://localhost/{name}/ingest"),
            weight: 1.0,
            health_url: None,
        }
    }

    fn state_with(registry: AnalyzerRegistry, capacity: usize) -> AppState {
        AppState {
            registry: Arc::new(registry),
            queue: distributor_core::Queue::bounded(capacity),
            queue_capacity: capacity,
        }
    }

    #[tokio::test]
    async fn reports_unhealthy_when_every_analyzer_is_down() {
        let registry = AnalyzerRegistry::new(vec![analyzer("a")]);
        registry.set_health("a", false);
        let state = state_with(registry, 10);
        let (status, Json(body)) = health(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unhealthy");
        assert_eq!(body.analyzers.healthy, 0);
        assert_eq!(body.analyzers.unhealthy, 1);
    }

    #[tokio::test]
    async fn reports_degraded_when_some_analyzers_are_down() {
        let registry = AnalyzerRegistry::new(vec![analyzer("a"), analyzer("b")]);
        registry.set_health("a", false);
        let state = state_with(registry, 10);
        let (status, Json(body)) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "degraded");
    }

    #[tokio::test]
    async fn queue_utilization_reflects_occupancy() {
        let registry = AnalyzerRegistry::new(vec![analyzer("a")]);
        let state = state_with(registry, 4);
        state
            .queue
            .offer(distributor_core::LogPacket {
                packet_id: "p".to_string(),
                agent_id: "a".to_string(),
                messages: vec![],
            })
            .ok();
        let (_, Json(body)) = health(State(state)).await;
        assert_eq!(body.queue_size, 1);
        assert!((body.queue_utilization - 0.25).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn analyzer_detail_carries_weight_and_received_counts() {
        let registry = AnalyzerRegistry::new(vec![analyzer("a")]);
        registry.record_success("a", 3);
        let state = state_with(registry, 10);
        let (_, Json(body)) = health(State(state)).await;
        assert_eq!(body.analyzer_details[0].weight, 1.0);
        assert_eq!(body.analyzer_details[0].packets_received, 1);
        assert_eq!(body.analyzer_details[0].messages_received, 3);
    }
}
