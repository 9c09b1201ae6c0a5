// SPDX-License-Identifier: Apache-2.0

//! Configuration model and loading for the log-packet distributor.
//!
//! The distributor reads a YAML configuration file describing the worker pool,
//! the bounded ingress queue, downstream timeouts, and the pool of analyzers to
//! distribute packets to. A handful of scalar fields can be overridden through
//! `DISTRIBUTOR_*` environment variables, which take precedence over the file;
//! CLI flags (handled by the top-level binary) take precedence over both.

pub mod error;
pub mod settings;

pub use error::Error;
pub use settings::{AnalyzerConfig, HealthSettings, ServerSettings, Settings, WorkerSettings};
