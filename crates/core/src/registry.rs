// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use distributor_config::AnalyzerConfig;
use rand::Rng;

use crate::error::Error;

/// Per-analyzer state tracked by the registry: its static configuration, its
/// current health, and the counters that feed `/stats` and `/health`.
#[derive(Debug, Clone)]
struct AnalyzerEntry {
    config: AnalyzerConfig,
    healthy: bool,
    /// Packets this analyzer acknowledged with a 2xx response.
    packets: u64,
    /// Total messages carried by those acknowledged packets.
    messages: u64,
}

/// A read-only view of one analyzer's configuration, health, and counters,
/// suitable for selection or for serializing into `/health` and `/stats`.
#[derive(Debug, Clone)]
pub struct AnalyzerSnapshot {
    /// Stable analyzer identifier.
    pub name: String,
    /// Ingestion endpoint.
    pub url: String,
    /// Configured relative weight.
    pub weight: f64,
    /// Whether the most recent health probe marked this analyzer healthy.
    pub healthy: bool,
    /// Packets this analyzer has accepted (2xx) over the process lifetime.
    pub packets: u64,
    /// Messages carried by those accepted packets.
    pub messages: u64,
}

/// Statistics as defined by the data model: accepted-by-a-downstream-analyzer
/// counts, not ingress-acceptance counts. `total_packets_accepted` is always
/// the sum of `per_analyzer_packets`, by construction.
#[derive(Debug, Clone)]
pub struct Stats {
    /// Packets successfully delivered to (acknowledged 2xx by) some analyzer.
    pub total_packets_accepted: u64,
    /// Messages carried by those successfully delivered packets.
    pub total_messages_accepted: u64,
    /// Packets dropped after exhausting retries or finding no healthy analyzer.
    pub failed_sends: u64,
    /// Per-analyzer successful-packet counts; a key is present for every
    /// configured analyzer from registry construction, value possibly 0.
    pub per_analyzer_packets: BTreeMap<String, u64>,
    /// Per-analyzer successful-message counts, same key guarantee.
    pub per_analyzer_messages: BTreeMap<String, u64>,
    /// When this registry (and thus the process) started serving traffic.
    pub start_time: DateTime<Utc>,
}

/// Ingress-side counters: how many packets/messages were accepted onto the
/// queue, and how many were rejected at the door for backpressure. These sit
/// outside the `Stats` record but are what `/health`'s
/// `total_packets_received`/`total_messages_received` report.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngressCounts {
    /// Packets handed to the queue by `/ingest`.
    pub total_received: u64,
    /// Messages carried by those packets.
    pub total_messages_received: u64,
    /// Packets turned away at `/ingest` because the queue was full.
    pub total_rejected: u64,
}

struct State {
    analyzers: Vec<AnalyzerEntry>,
    failed_sends: u64,
    ingress: IngressCounts,
    start_time: DateTime<Utc>,
}

/// Shared registry of analyzer configuration, health, and stats.
///
/// A single mutex guards both the per-analyzer entries and the global
/// counters so that a `/stats` or `/health` read is always internally
/// consistent. No network I/O happens while the lock is held; health probes
/// and forwarding requests complete before their outcome is recorded here.
pub struct AnalyzerRegistry {
    state: Mutex<State>,
}

impl AnalyzerRegistry {
    /// Builds a registry from configuration, with every analyzer initially
    /// marked healthy so the pool is usable before the first probe sweep.
    pub fn new(analyzers: Vec<AnalyzerConfig>) -> Self {
        let analyzers = analyzers
            .into_iter()
            .map(|config| AnalyzerEntry {
                config,
                healthy: true,
                packets: 0,
                messages: 0,
            })
            .collect();
        Self {
            state: Mutex::new(State {
                analyzers,
                failed_sends: 0,
                ingress: IngressCounts::default(),
                start_time: Utc::now(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of every configured analyzer, healthy or not.
    pub fn snapshot(&self) -> Vec<AnalyzerSnapshot> {
        self.lock().analyzers.iter().map(to_snapshot).collect()
    }

    /// Snapshot of only the analyzers currently marked healthy. This is the
    /// candidate set the selector draws from.
    pub fn healthy_snapshot(&self) -> Vec<AnalyzerSnapshot> {
        self.lock()
            .analyzers
            .iter()
            .filter(|entry| entry.healthy)
            .map(to_snapshot)
            .collect()
    }

    /// Filters to the healthy subset and performs the weighted draw in one
    /// locked critical section, so the draw is atomic with respect to
    /// concurrent `set_health` calls: a selection in progress can never
    /// observe an analyzer mid-transition, and a `set_health` call can never
    /// interleave between "take the healthy snapshot" and "draw from it".
    /// The draw itself is CPU-only, so holding the lock across it never
    /// risks holding it across network I/O.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<AnalyzerSnapshot, Error> {
        let state = self.lock();
        let healthy: Vec<AnalyzerSnapshot> = state
            .analyzers
            .iter()
            .filter(|entry| entry.healthy)
            .map(to_snapshot)
            .collect();
        crate::selector::select(&healthy, rng).map(AnalyzerSnapshot::clone)
    }

    /// Updates an analyzer's health flag, as reported by the background
    /// prober. A no-op if the name is not in the pool. Idempotent: repeated
    /// calls with the same value produce no log line.
    pub fn set_health(&self, name: &str, healthy: bool) {
        let mut state = self.lock();
        if let Some(entry) = state.analyzers.iter_mut().find(|e| e.config.name == name) {
            if entry.healthy != healthy {
                tracing::info!(analyzer = name, healthy, "analyzer health changed");
            }
            entry.healthy = healthy;
        }
    }

    /// Records that `name` accepted a packet (2xx) carrying `message_count`
    /// messages. A no-op if the name is not in the pool.
    pub fn record_success(&self, name: &str, message_count: usize) {
        let mut state = self.lock();
        if let Some(entry) = state.analyzers.iter_mut().find(|e| e.config.name == name) {
            entry.packets += 1;
            entry.messages += message_count as u64;
        }
    }

    /// Records that a packet was dropped after exhausting retries, or
    /// because no healthy analyzer was available to try.
    pub fn record_failed_send(&self) {
        self.lock().failed_sends += 1;
    }

    /// Records that a packet carrying `message_count` messages was accepted
    /// onto the ingress queue.
    pub fn record_received(&self, message_count: usize) {
        let mut state = self.lock();
        state.ingress.total_received += 1;
        state.ingress.total_messages_received += message_count as u64;
    }

    /// Records that `/ingest` rejected a packet because the queue was full.
    pub fn record_queue_rejected(&self) {
        self.lock().ingress.total_rejected += 1;
    }

    /// Current ingress-side counters (received and queue-rejected packets).
    pub fn ingress_counts(&self) -> IngressCounts {
        self.lock().ingress
    }

    /// Current statistics, matching the data model's `Stats` record exactly.
    pub fn stats(&self) -> Stats {
        let state = self.lock();
        let mut per_analyzer_packets = BTreeMap::new();
        let mut per_analyzer_messages = BTreeMap::new();
        let mut total_packets_accepted = 0u64;
        let mut total_messages_accepted = 0u64;
        for entry in &state.analyzers {
            per_analyzer_packets.insert(entry.config.name.clone(), entry.packets);
            per_analyzer_messages.insert(entry.config.name.clone(), entry.messages);
            total_packets_accepted += entry.packets;
            total_messages_accepted += entry.messages;
        }
        Stats {
            total_packets_accepted,
            total_messages_accepted,
            failed_sends: state.failed_sends,
            per_analyzer_packets,
            per_analyzer_messages,
            start_time: state.start_time,
        }
    }
}

fn to_snapshot(entry: &AnalyzerEntry) -> AnalyzerSnapshot {
    AnalyzerSnapshot {
        name: entry.config.name.clone(),
        url: entry.config.url.clone(),
        weight: entry.config.weight,
        healthy: entry.healthy,
        packets: entry.packets,
        messages: entry.messages,
    }
}
