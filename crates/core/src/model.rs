// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity levels accepted in a message's `level` field, matched
/// case-insensitively.
const VALID_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "FATAL"];

/// A single structured log message within a packet. Opaque to the core
/// beyond what is needed for size accounting and ingress validation; the
/// body is forwarded to the chosen analyzer verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    /// RFC 3339 timestamp as emitted by the source.
    pub timestamp: String,
    /// Severity level, e.g. `"INFO"`, `"ERROR"`.
    pub level: String,
    /// Emitting service or host identifier.
    pub source: String,
    /// Free-form log body.
    pub message: String,
    /// Opaque structured metadata carried alongside the message.
    #[serde(default)]
    pub metadata: Value,
}

/// A batch of log messages accepted by a single `/ingest` call and forwarded
/// to exactly one analyzer as a unit. A packet is atomic: it is delivered to
/// exactly one analyzer or dropped, never split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPacket {
    /// Opaque identifier for this packet, carried through logging/tracing.
    pub packet_id: String,
    /// Identifier of the upstream agent that produced this packet.
    pub agent_id: String,
    /// Messages in the batch, in receipt order.
    pub messages: Vec<LogMessage>,
}

/// Reasons a packet fails ingress validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// `packet_id` was empty.
    #[error("packet_id must not be empty")]
    EmptyPacketId,
    /// `agent_id` was empty.
    #[error("agent_id must not be empty")]
    EmptyAgentId,
    /// `messages` was empty.
    #[error("messages must contain at least one entry")]
    EmptyMessages,
    /// A message's `level` was not one of the recognized severities.
    #[error("message {index} has an invalid level {level:?}")]
    InvalidLevel {
        /// Index of the offending message within `messages`.
        index: usize,
        /// The raw, rejected level value.
        level: String,
    },
    /// A message's `timestamp` did not parse as RFC 3339.
    #[error("message {index} has a non-RFC-3339 timestamp {timestamp:?}")]
    InvalidTimestamp {
        /// Index of the offending message within `messages`.
        index: usize,
        /// The raw, rejected timestamp value.
        timestamp: String,
    },
}

impl LogPacket {
    /// Total number of messages in the packet, used for message-count stats.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Validates the packet against the ingress schema: non-empty
    /// `packet_id`/`agent_id`/`messages`, a recognized `level` and an
    /// RFC 3339 `timestamp` on every message. Returns the first violation
    /// found; the core never re-validates a packet once it is queued.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.packet_id.is_empty() {
            return Err(ValidationError::EmptyPacketId);
        }
        if self.agent_id.is_empty() {
            return Err(ValidationError::EmptyAgentId);
        }
        if self.messages.is_empty() {
            return Err(ValidationError::EmptyMessages);
        }
        for (index, message) in self.messages.iter().enumerate() {
            if !VALID_LEVELS
                .iter()
                .any(|valid| valid.eq_ignore_ascii_case(&message.level))
            {
                return Err(ValidationError::InvalidLevel {
                    index,
                    level: message.level.clone(),
                });
            }
            if chrono::DateTime::parse_from_rfc3339(&message.timestamp).is_err() {
                return Err(ValidationError::InvalidTimestamp {
                    index,
                    timestamp: message.timestamp.clone(),
                });
            }
        }
        Ok(())
    }
}
