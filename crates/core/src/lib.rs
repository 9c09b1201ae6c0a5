// SPDX-License-Identifier: Apache-2.0

//! Distribution engine for the log-packet distributor.
//!
//! Owns the analyzer registry and stats, the weighted selector, the bounded
//! ingress queue, the worker pool that drains it, and the background health
//! prober. The HTTP surface (in `distributor-api`) is a thin layer on top of
//! the types here.

pub mod client;
pub mod error;
pub mod model;
pub mod prober;
pub mod queue;
pub mod registry;
pub mod selector;
pub mod worker;

pub use error::Error;
pub use model::{LogMessage, LogPacket, ValidationError};
pub use queue::Queue;
pub use registry::{AnalyzerRegistry, AnalyzerSnapshot, IngressCounts, Stats};
