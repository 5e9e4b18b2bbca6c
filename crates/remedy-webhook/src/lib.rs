//! Remedy Webhook Library
//!
//! CI/CD platform integration for the Remedy recovery engine:
//! authenticated webhook ingestion, payload normalization, idempotent
//! dispatch into the `remedy-core` orchestrator, and the axum HTTP
//! surface serving one route per configured platform.

pub mod error;
pub mod event;
pub mod manager;
pub mod routes;
pub mod signature;

pub use error::{WebhookError, WebhookResult};
pub use event::{CICDEvent, DeliveryStatus};
pub use manager::{CICDIntegrationManager, RecoveryResponse};
pub use routes::router;
pub use signature::{HmacSignatureValidator, TokenValidator, WebhookValidator};
