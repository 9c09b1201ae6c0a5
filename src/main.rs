// SPDX-License-Identifier: Apache-2.0

//! Entry point for the log-packet distributor binary.
//!
//! Loads configuration (YAML file, then environment, then CLI flags, in
//! increasing precedence), wires up the registry, queue, worker pool, health
//! prober, and ingress server in dependency order, then waits for `SIGINT`
//! or `SIGTERM` to tear everything back down in reverse order.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use distributor_api::AppState;
use distributor_config::Settings;
use distributor_core::{client, prober, registry::AnalyzerRegistry, worker, Queue};
use tokio_util::sync::CancellationToken;

/// Weighted log-packet distributor.
#[derive(Debug, Parser)]
#[command(name = "log-distributor", about = "Distributes log packets across a weighted pool of analyzers")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, short = 'c', env = "DISTRIBUTOR_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Overrides the configured server bind address.
    #[arg(long)]
    bind_address: Option<String>,

    /// Overrides the configured worker count.
    #[arg(long)]
    worker_count: Option<usize>,

    /// Overrides the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)?;

    if let Some(bind_address) = cli.bind_address {
        settings.server.bind_address = bind_address;
    }
    if let Some(worker_count) = cli.worker_count {
        settings.worker.count = worker_count;
    }
    if let Some(log_level) = cli.log_level {
        settings.log_level = log_level;
    }

    let filter = tracing_subscriber::EnvFilter::try_new(&settings.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(settings))
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        analyzers = settings.analyzers.len(),
        workers = settings.worker.count,
        "starting log-distributor"
    );

    let registry = Arc::new(AnalyzerRegistry::new(settings.analyzers.clone()));
    let queue = Queue::bounded(settings.worker.queue_capacity);
    let data_client = client::build_client(settings.worker.send_timeout)?;
    let health_client = client::build_client(settings.health.probe_timeout)?;
    let cancel = CancellationToken::new();

    let prober_handle = tokio::spawn(prober::run(
        settings.analyzers.clone(),
        Arc::clone(&registry),
        health_client,
        settings.health.clone(),
        cancel.clone(),
    ));

    let worker_handles: Vec<_> = (0..settings.worker.count)
        .map(|id| {
            tokio::spawn(worker::run(
                id,
                queue.clone(),
                Arc::clone(&registry),
                data_client.clone(),
                settings.worker.clone(),
                cancel.clone(),
            ))
        })
        .collect();

    let app_state = AppState {
        registry: Arc::clone(&registry),
        queue: queue.clone(),
        queue_capacity: settings.worker.queue_capacity,
    };
    let router = distributor_api::router(app_state);

    let server_cancel = cancel.clone();
    let bind_address = settings.server.bind_address.clone();
    let mut server = tokio::spawn(async move {
        distributor_api::serve(&bind_address, router, server_cancel).await
    });

    // Race the shutdown signal against the server task itself: a bind
    // failure (or any other early exit) must trigger the same teardown
    // sequence rather than leaving the process waiting on a signal that
    // will never matter, and must be surfaced as a non-zero exit.
    let bind_failure = tokio::select! {
        () = wait_for_shutdown_signal() => {
            tracing::info!("shutdown signal received, stopping ingress server");
            None
        }
        result = &mut server => Some(result),
    };
    cancel.cancel();

    let server_outcome = match bind_failure {
        Some(result) => result,
        None => server.await,
    };
    let bind_error = match server_outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => {
            tracing::error!(%err, "ingress server exited with an error");
            Some(anyhow::anyhow!("ingress server failed: {err}"))
        }
        Err(err) => {
            tracing::error!(%err, "ingress server task panicked");
            Some(anyhow::anyhow!("ingress server task panicked: {err}"))
        }
    };

    // Closing the queue stops accepting new work (any straggling `offer`
    // from an in-flight request simply fails) while letting already-buffered
    // packets drain; `take()` then returns `None` for every worker once the
    // buffer empties, and each worker's loop exits on its own.
    queue.close();
    tracing::info!(queue_size = queue.len(), "draining in-flight workers");

    let drain = futures::future::join_all(worker_handles);
    match tokio::time::timeout(settings.server.shutdown_grace, drain).await {
        Ok(results) => {
            for result in results {
                if let Err(err) = result {
                    tracing::error!(%err, "worker task panicked");
                }
            }
        }
        Err(_) => {
            tracing::warn!(
                queue_size = queue.len(),
                "shutdown grace period elapsed with packets still draining"
            );
        }
    }

    prober_handle.abort();

    let stats = registry.stats();
    tracing::info!(
        total_packets_accepted = stats.total_packets_accepted,
        total_messages_accepted = stats.total_messages_accepted,
        failed_sends = stats.failed_sends,
        "shutdown complete"
    );

    match bind_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
