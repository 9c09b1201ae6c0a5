// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use distributor_config::WorkerSettings;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::model::LogPacket;
use crate::queue::Queue;
use crate::registry::AnalyzerRegistry;

/// Runs one worker task's main loop: pull packets off the queue and attempt
/// delivery, retrying against freshly selected analyzers on failure, until
/// the queue is closed and drained. The queue, not a cancellation signal,
/// drives this loop's exit: the lifecycle controller closes the queue during
/// shutdown and lets workers finish draining whatever was already buffered.
pub async fn run(
    worker_id: usize,
    queue: Queue,
    registry: Arc<AnalyzerRegistry>,
    client: reqwest::Client,
    settings: WorkerSettings,
    cancel: CancellationToken,
) {
    let mut rng = SmallRng::from_entropy();
    while let Some(packet) = queue.take().await {
        deliver(&packet, &registry, &client, &settings, &mut rng, &cancel).await;
    }
    tracing::debug!(worker_id, "worker exiting, queue drained");
}

async fn deliver(
    packet: &LogPacket,
    registry: &AnalyzerRegistry,
    client: &reqwest::Client,
    settings: &WorkerSettings,
    rng: &mut SmallRng,
    cancel: &CancellationToken,
) {
    let message_count = packet.message_count();
    let max_attempts = settings.max_retries + 1;
    let mut last_error = None;

    for attempt in 0..max_attempts {
        let analyzer = match registry.select(rng) {
            Ok(analyzer) => analyzer,
            Err(err) => {
                last_error = Some(err);
                break;
            }
        };

        match send_once(client, &analyzer.name, &analyzer.url, packet).await {
            Ok(()) => {
                registry.record_success(&analyzer.name, message_count);
                return;
            }
            Err(err) => {
                tracing::warn!(
                    packet_id = %packet.packet_id,
                    analyzer = %analyzer.name,
                    attempt,
                    error = %err,
                    "delivery attempt failed"
                );
                let retryable = err.is_retryable();
                last_error = Some(err);
                if !retryable || attempt + 1 == max_attempts {
                    break;
                }
                tokio::select! {
                    () = tokio::time::sleep(backoff_delay(settings, attempt)) => {}
                    () = cancel.cancelled() => {
                        tracing::debug!(
                            packet_id = %packet.packet_id,
                            "shutdown interrupted retry backoff"
                        );
                        break;
                    }
                }
            }
        }
    }

    tracing::error!(
        packet_id = %packet.packet_id,
        error = ?last_error,
        "packet failed after exhausting all attempts"
    );
    registry.record_failed_send();
}

async fn send_once(
    client: &reqwest::Client,
    analyzer_name: &str,
    url: &str,
    packet: &LogPacket,
) -> Result<(), Error> {
    let response = client
        .post(url)
        .json(packet)
        .send()
        .await
        .map_err(|source| Error::Transport {
            analyzer: analyzer_name.to_string(),
            source,
        })?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(Error::AnalyzerRejected {
            analyzer: analyzer_name.to_string(),
            status: response.status().as_u16(),
        })
    }
}

fn backoff_delay(settings: &WorkerSettings, attempt: usize) -> std::time::Duration {
    let base = settings.retry_base_delay.as_secs_f64();
    let scaled = base * settings.backoff_multiplier.powi(attempt as i32);
    std::time::Duration::from_secs_f64(scaled.min(settings.max_retry_delay.as_secs_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn settings() -> WorkerSettings {
        WorkerSettings {
            count: 1,
            queue_capacity: 10,
            send_timeout: Duration::from_secs(1),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn backoff_grows_geometrically_until_capped() {
        let cfg = settings();
        let d0 = backoff_delay(&cfg, 0);
        let d1 = backoff_delay(&cfg, 1);
        let d2 = backoff_delay(&cfg, 2);
        assert_eq!(d0, Duration::from_millis(100));
        assert_eq!(d1, Duration::from_millis(200));
        assert_eq!(d2, Duration::from_millis(400));
    }

    #[test]
    fn backoff_never_exceeds_the_configured_ceiling() {
        let mut cfg = settings();
        cfg.max_retry_delay = Duration::from_millis(150);
        assert_eq!(backoff_delay(&cfg, 5), Duration::from_millis(150));
    }
}
