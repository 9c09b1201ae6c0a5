// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors that can occur while loading or validating distributor configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration file could not be read from disk.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was passed to the loader.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file's contents are not valid YAML, or do not match
    /// the expected schema.
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        /// Path that was passed to the loader.
        path: PathBuf,
        /// Underlying deserialization failure.
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment variable override was present but could not be parsed
    /// into the expected type.
    #[error("environment variable {name} has an invalid value {value:?}: {reason}")]
    InvalidEnvOverride {
        /// Name of the offending environment variable.
        name: &'static str,
        /// Raw value read from the environment.
        value: String,
        /// Human-readable reason the value was rejected.
        reason: String,
    },

    /// The analyzer pool failed structural validation (empty pool, duplicate
    /// names, or a negative weight).
    #[error("invalid analyzer pool: {0}")]
    InvalidAnalyzerPool(String),
}
