//! Domain-level error taxonomy for Remedy.

use crate::failure::Severity;

/// Remedy domain errors.
///
/// Planning-time configuration gaps (`NoStrategyFound`, `NoSafeStrategy`)
/// are surfaced as failed plans and folded into the caller-facing
/// recommendations; they are never silently substituted.
#[derive(Debug, thiserror::Error)]
pub enum RemedyError {
    #[error("no recovery strategy found for severity {severity:?} and no generic fallback is configured")]
    NoStrategyFound { severity: Severity },

    #[error("no downtime-safe strategy available for failure signature {signature}")]
    NoSafeStrategy { signature: String },

    #[error("invalid strategy '{id}': {reason}")]
    InvalidStrategy { id: String, reason: String },

    #[error("unknown strategy id referenced by generic fallback: {0}")]
    UnknownStrategyId(String),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("execution not found for signature: {0}")]
    ExecutionNotFound(String),

    #[error("artifact digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Remedy domain operations.
pub type Result<T> = std::result::Result<T, RemedyError>;
