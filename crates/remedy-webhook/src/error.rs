//! Error taxonomy for the webhook layer.

/// Errors surfaced to webhook callers.
///
/// `Unauthorized` is the only hard rejection: everything else that
/// reaches the dispatch logic is folded into a well-formed
/// `RecoveryResponse`.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook authentication failed: {0}")]
    Unauthorized(&'static str),

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] remedy_core::RemedyError),
}

/// Result type for webhook operations.
pub type WebhookResult<T> = std::result::Result<T, WebhookError>;
