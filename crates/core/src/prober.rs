// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use distributor_config::{AnalyzerConfig, HealthSettings};
use tokio_util::sync::CancellationToken;

use crate::registry::AnalyzerRegistry;

/// Runs the background health prober: every `Tprobe` interval, concurrently
/// issues a `GET` against each analyzer's health endpoint and updates the
/// registry with the outcome. Uses a client distinct from the data path's so
/// a backlog of slow forwarding requests cannot delay health detection.
pub async fn run(
    analyzers: Vec<AnalyzerConfig>,
    registry: Arc<AnalyzerRegistry>,
    client: reqwest::Client,
    settings: HealthSettings,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = tokio::time::sleep(settings.probe_interval) => {}
            () = cancel.cancelled() => break,
        }

        let checks = analyzers
            .iter()
            .map(|analyzer| probe_one(&client, analyzer, &registry));
        futures::future::join_all(checks).await;
    }
}

async fn probe_one(
    client: &reqwest::Client,
    analyzer: &AnalyzerConfig,
    registry: &AnalyzerRegistry,
) {
    let url = analyzer.health_url();
    let healthy = match client.get(&url).send().await {
        Ok(response) => response.status().is_success(),
        Err(error) => {
            tracing::debug!(analyzer = analyzer.name, %error, "health probe failed");
            false
        }
    };
    registry.set_health(&analyzer.name, healthy);
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn probe_marks_analyzer_healthy_on_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let analyzer = AnalyzerConfig {
            name: "a".to_string(),
            url: format!("{}/ingest", server.uri()),
            weight: 1.0,
            health_url: None,
        };
        let registry = Arc::new(AnalyzerRegistry::new(vec![analyzer.clone()]));
        registry.set_health("a", false);

        let client = reqwest::Client::new();
        probe_one(&client, &analyzer, &registry).await;

        assert!(registry.healthy_snapshot().iter().any(|a| a.name == "a"));
    }

    #[tokio::test]
    async fn probe_marks_analyzer_unhealthy_on_connection_failure() {
        let analyzer = AnalyzerConfig {
            name: "a".to_string(),
            url: "http://127.0.0.1:1/ingest".to_string(),
            weight: 1.0,
            health_url: None,
        };
        let registry = Arc::new(AnalyzerRegistry::new(vec![analyzer.clone()]));

        let client = reqwest::Client::new();
        probe_one(&client, &analyzer, &registry).await;

        assert!(registry.healthy_snapshot().is_empty());
    }
}
