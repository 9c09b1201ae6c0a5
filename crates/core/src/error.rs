// SPDX-License-Identifier: Apache-2.0

/// Errors that can occur while routing a packet to an analyzer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No analyzer in the pool is currently marked healthy.
    #[error("no healthy analyzer is available")]
    NoAnalyzerAvailable,

    /// The ingress queue is at capacity and cannot accept another packet.
    #[error("ingress queue is full")]
    QueueFull,

    /// The request to the analyzer could not be completed at all (connect
    /// failure, timeout, or the client was cancelled mid-flight).
    #[error("request to analyzer {analyzer} failed: {source}")]
    Transport {
        /// Name of the analyzer the request was sent to.
        analyzer: String,
        /// Underlying reqwest failure.
        #[source]
        source: reqwest::Error,
    },

    /// The analyzer responded, but with a status code the distributor treats
    /// as a permanent failure (4xx) or a retryable failure (5xx) exhausted
    /// across all attempts.
    #[error("analyzer {analyzer} responded with status {status}")]
    AnalyzerRejected {
        /// Name of the analyzer that rejected the packet.
        analyzer: String,
        /// HTTP status code returned by the analyzer.
        status: u16,
    },
}

impl Error {
    /// True when retrying the same packet against a freshly selected
    /// analyzer could plausibly succeed. Permanent (4xx) rejections are not
    /// retryable; transport failures and 5xx responses are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::AnalyzerRejected { status, .. } => !(400..500).contains(status),
            Error::NoAnalyzerAvailable | Error::QueueFull => false,
        }
    }
}
