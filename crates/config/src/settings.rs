// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

const ENV_BIND_ADDRESS: &str = "DISTRIBUTOR_BIND_ADDRESS";
const ENV_WORKER_COUNT: &str = "DISTRIBUTOR_WORKER_COUNT";
const ENV_QUEUE_CAPACITY: &str = "DISTRIBUTOR_QUEUE_CAPACITY";
const ENV_LOG_LEVEL: &str = "DISTRIBUTOR_LOG_LEVEL";

/// Top-level configuration for the distributor, assembled from a YAML file
/// with environment-variable overrides layered on top.
///
/// CLI flags take the highest precedence and are applied by the caller after
/// [`Settings::load`] returns, by mutating the relevant fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerSettings,

    /// Ingress queue and worker pool tuning.
    #[serde(default)]
    pub worker: WorkerSettings,

    /// Health probe tuning.
    #[serde(default)]
    pub health: HealthSettings,

    /// Log level passed to the tracing env-filter (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// The pool of downstream analyzer services.
    pub analyzers: Vec<AnalyzerConfig>,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Address the ingress HTTP server binds to, e.g. `"0.0.0.0:8080"`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bound on how long, after the queue is closed, shutdown waits for
    /// workers to drain in-flight and buffered packets before giving up on
    /// them and exiting anyway.
    #[serde(default = "default_shutdown_grace", with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

/// Worker pool and ingress queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSettings {
    /// Number of concurrent worker tasks draining the ingress queue (`Nw`).
    #[serde(default = "default_worker_count")]
    pub count: usize,

    /// Maximum number of packets the ingress queue will hold before `/ingest`
    /// starts returning `503` (`Qmax`).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Per-attempt timeout for a worker's POST to an analyzer (`Tsend`).
    #[serde(default = "default_send_timeout", with = "humantime_serde")]
    pub send_timeout: Duration,

    /// Maximum number of retries after the first attempt fails (`MaxRetries`).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base delay for the exponential backoff between retry attempts (`Tretry`).
    #[serde(default = "default_retry_base_delay", with = "humantime_serde")]
    pub retry_base_delay: Duration,

    /// Ceiling on the backoff delay, regardless of attempt count.
    #[serde(default = "default_max_retry_delay", with = "humantime_serde")]
    pub max_retry_delay: Duration,

    /// Multiplier applied to the backoff delay after each retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            send_timeout: default_send_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay: default_retry_base_delay(),
            max_retry_delay: default_max_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Background health-probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthSettings {
    /// Interval between successive probe sweeps across the analyzer pool (`Tprobe`).
    #[serde(default = "default_probe_interval", with = "humantime_serde")]
    pub probe_interval: Duration,

    /// Per-analyzer timeout for a single health check request (`Thealth`).
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            probe_interval: default_probe_interval(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

/// A single downstream analyzer entry, as configured by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Stable, human-readable identifier used in stats and logs.
    pub name: String,

    /// Ingestion endpoint the worker pool POSTs packets to.
    pub url: String,

    /// Relative weight used by the selector; need not sum to 1 across the pool.
    pub weight: f64,

    /// Health-check endpoint. When absent, it is derived from `url` by
    /// stripping the last path segment and appending `/health`.
    #[serde(default)]
    pub health_url: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(30)
}

fn default_worker_count() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    5000
}

fn default_send_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_base_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_retry_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_probe_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads settings from a YAML file, then applies any recognized
    /// `DISTRIBUTOR_*` environment variable overrides, then validates the
    /// analyzer pool.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings =
            serde_yaml::from_str(&raw).map_err(|source| Error::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Overlays recognized environment variables onto already-loaded
    /// settings. Unset variables are left untouched.
    pub fn apply_env_overrides(&mut self) -> Result<(), Error> {
        if let Ok(value) = std::env::var(ENV_BIND_ADDRESS) {
            self.server.bind_address = value;
        }
        if let Ok(value) = std::env::var(ENV_WORKER_COUNT) {
            self.worker.count = value.parse().map_err(|_| Error::InvalidEnvOverride {
                name: ENV_WORKER_COUNT,
                value: value.clone(),
                reason: "expected a positive integer".to_string(),
            })?;
        }
        if let Ok(value) = std::env::var(ENV_QUEUE_CAPACITY) {
            self.worker.queue_capacity = value.parse().map_err(|_| Error::InvalidEnvOverride {
                name: ENV_QUEUE_CAPACITY,
                value: value.clone(),
                reason: "expected a positive integer".to_string(),
            })?;
        }
        if let Ok(value) = std::env::var(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        Ok(())
    }

    /// Validates structural invariants of the analyzer pool. An empty pool,
    /// a duplicate name, or a negative weight is rejected outright; a weight
    /// sum outside `[0.99, 1.01]` is only logged as a warning, since the
    /// selector renormalizes at selection time regardless.
    pub fn validate(&self) -> Result<(), Error> {
        if self.analyzers.is_empty() {
            return Err(Error::InvalidAnalyzerPool(
                "at least one analyzer must be configured".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.analyzers.len());
        for analyzer in &self.analyzers {
            if !seen.insert(analyzer.name.as_str()) {
                return Err(Error::InvalidAnalyzerPool(format!(
                    "duplicate analyzer name {:?}",
                    analyzer.name
                )));
            }
            if analyzer.weight < 0.0 || !analyzer.weight.is_finite() {
                return Err(Error::InvalidAnalyzerPool(format!(
                    "analyzer {:?} has an invalid weight {}",
                    analyzer.name, analyzer.weight
                )));
            }
        }

        let total_weight: f64 = self.analyzers.iter().map(|a| a.weight).sum();
        if !(0.99..=1.01).contains(&total_weight) {
            tracing::warn!(
                total_weight,
                analyzer_count = self.analyzers.len(),
                "analyzer weights do not sum to 1.0; the selector will renormalize at runtime"
            );
        }

        Ok(())
    }
}

impl AnalyzerConfig {
    /// Returns the configured health URL, or derives one from `url` by
    /// stripping the last path segment and appending `/health`.
    pub fn health_url(&self) -> String {
        if let Some(explicit) = &self.health_url {
            return explicit.clone();
        }
        match self.url.rfind('/') {
            Some(idx) => format!("{}/health", &self.url[..idx]),
            None => format!("{}/health", self.url),
        }
    }
}
