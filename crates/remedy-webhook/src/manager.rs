//! Webhook event processing and recovery dispatch.
//!
//! Order of operations per call is fixed: authenticate, parse, check
//! idempotency, then dispatch. Authentication failure is the only hard
//! rejection; everything past it folds into a well-formed
//! [`RecoveryResponse`], with failure detail carried in the
//! recommendations.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{WebhookError, WebhookResult};
use crate::event::{normalize, CICDEvent};
use crate::signature::{validator_for, WebhookValidator};
use remedy_core::{
    CategorizedFailure, FailureCategorizer, FailureContext, FailureSignals, PlatformConfig,
    RecoveryDisposition, RecoveryExecution, RecoveryOrchestrator, RemedyError, TraversalOutcome,
    METRICS,
};

/// Answer returned to the webhook caller. Not persisted beyond the
/// idempotency cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResponse {
    pub recovery_successful: bool,
    /// True only when recovery succeeded and the failure class is known
    /// to be transient.
    pub should_retry_deployment: bool,
    /// Ordered, human-readable next steps.
    pub recommendations: Vec<String>,
}

impl RecoveryResponse {
    fn no_action(reason: impl Into<String>) -> Self {
        Self {
            recovery_successful: false,
            should_retry_deployment: false,
            recommendations: vec![reason.into()],
        }
    }
}

struct Platform {
    config: PlatformConfig,
    validator: Box<dyn WebhookValidator>,
}

/// Validates, normalizes, and dispatches inbound platform webhooks.
pub struct CICDIntegrationManager {
    platforms: HashMap<String, Platform>,
    categorizer: FailureCategorizer,
    orchestrator: Arc<RecoveryOrchestrator>,
    /// Responses keyed by event id; replays return the cached answer
    /// without re-triggering recovery.
    processed: Mutex<HashMap<String, RecoveryResponse>>,
}

impl CICDIntegrationManager {
    pub fn new(
        platforms: &[PlatformConfig],
        categorizer: FailureCategorizer,
        orchestrator: Arc<RecoveryOrchestrator>,
    ) -> Self {
        let platforms = platforms
            .iter()
            .map(|config| {
                let validator = validator_for(&config.auth);
                (
                    config.name.clone(),
                    Platform {
                        config: config.clone(),
                        validator,
                    },
                )
            })
            .collect();
        Self {
            platforms,
            categorizer,
            orchestrator,
            processed: Mutex::new(HashMap::new()),
        }
    }

    /// Configured platforms, for route construction.
    pub fn platform_configs(&self) -> Vec<PlatformConfig> {
        self.platforms
            .values()
            .map(|p| p.config.clone())
            .collect()
    }

    /// Process one inbound webhook call.
    ///
    /// # Errors
    ///
    /// * `UnknownPlatform` — no platform is configured under this name.
    /// * `Unauthorized` — signature or token validation failed. Raised
    ///   before any parsing.
    /// * `MalformedPayload` — the body is not valid JSON.
    pub async fn process_webhook_event(
        &self,
        platform: &str,
        raw_payload: &[u8],
        headers: &HeaderMap,
    ) -> WebhookResult<RecoveryResponse> {
        let entry = self
            .platforms
            .get(platform)
            .ok_or_else(|| WebhookError::UnknownPlatform(platform.to_string()))?;

        entry.validator.validate(raw_payload, headers)?;

        let payload: serde_json::Value = serde_json::from_slice(raw_payload)?;
        let Some(event) = normalize(platform, &payload) else {
            debug!(platform, "unrecognized event shape dropped");
            return Ok(RecoveryResponse::no_action(
                "event shape not recognized; no action taken",
            ));
        };

        {
            let processed = self.processed.lock().await;
            if let Some(previous) = processed.get(&event.event_id) {
                info!(event_id = %event.event_id, "duplicate event; returning cached response");
                METRICS.inc_events_deduplicated();
                return Ok(previous.clone());
            }
        }

        let response = self.dispatch(entry, &event).await;

        self.processed
            .lock()
            .await
            .insert(event.event_id.clone(), response.clone());
        Ok(response)
    }

    async fn dispatch(&self, entry: &Platform, event: &CICDEvent) -> RecoveryResponse {
        if !event.status.indicates_failure() {
            return RecoveryResponse::no_action(format!(
                "event status {:?} does not indicate a failure; no action taken",
                event.status
            ));
        }

        let failure = self.categorize(event);

        if !entry
            .config
            .allowed_environments
            .contains(&event.environment)
        {
            info!(
                platform = %entry.config.name,
                environment = event.environment.as_str(),
                "environment not on the auto-recovery allow-list"
            );
            return RecoveryResponse {
                recovery_successful: false,
                should_retry_deployment: false,
                recommendations: advisory_recommendations(&failure),
            };
        }

        match self.orchestrator.handle_failure(failure.clone()).await {
            Ok(RecoveryDisposition::Executed(execution)) => {
                execution_response(&failure, &execution)
            }
            Ok(RecoveryDisposition::Coalesced { signature }) => RecoveryResponse {
                recovery_successful: false,
                should_retry_deployment: false,
                recommendations: vec![format!(
                    "a recovery for this failure is already in flight (signature {}); \
                     this signal was attached to it",
                    signature.short()
                )],
            },
            Err(err) => {
                warn!(error = %err, "recovery dispatch failed");
                planning_failure_response(&failure, &err)
            }
        }
    }

    fn categorize(&self, event: &CICDEvent) -> CategorizedFailure {
        let signals = FailureSignals {
            error_messages: event.messages.clone(),
            log_lines: Vec::new(),
            metrics: Default::default(),
            status_codes: Vec::new(),
        };
        let mut context = FailureContext::new(event.environment);
        if let Some(component) = &event.component {
            context = context.with_component(component.clone());
        }
        self.categorizer.categorize(&signals, context)
    }
}

/// Recommendations for environments outside the auto-recovery
/// allow-list: classification detail only, no execution.
fn advisory_recommendations(failure: &CategorizedFailure) -> Vec<String> {
    let mut recommendations = vec![format!(
        "automatic recovery is disabled for {}; classified as {}/{:?}",
        failure.context.environment.as_str(),
        failure.kind.as_str(),
        failure.severity
    )];
    if let Some(target) = failure.severity.response_target() {
        recommendations.push(format!(
            "respond within {} minutes",
            target.as_secs() / 60
        ));
    }
    recommendations.push("review the failing deployment and remediate manually".to_string());
    recommendations
}

fn execution_response(
    failure: &CategorizedFailure,
    execution: &RecoveryExecution,
) -> RecoveryResponse {
    let mut recommendations = Vec::new();

    if execution.success {
        if let Some(path) = execution.paths.iter().find(|p| p.succeeded()) {
            recommendations.push(format!(
                "recovered via strategy '{}' ({} steps)",
                path.strategy_id,
                path.steps.len()
            ));
        }
        if failure.kind.is_transient() {
            recommendations
                .push("failure class is transient; safe to retry the deployment".to_string());
        } else {
            recommendations.push(format!(
                "failure class {} is not transient; investigate before redeploying",
                failure.kind.as_str()
            ));
        }
    } else {
        for path in &execution.paths {
            let note = match path.outcome {
                TraversalOutcome::Success => continue,
                TraversalOutcome::Failure => "failed",
                TraversalOutcome::Timeout => "timed out (possible cyclic strategy)",
            };
            recommendations.push(format!("strategy '{}' {}", path.strategy_id, note));
        }
        if execution.metrics.manual_interventions > 0 {
            recommendations.push("manual intervention required".to_string());
        }
        if let Some(target) = failure.severity.response_target() {
            recommendations.push(format!(
                "respond within {} minutes",
                target.as_secs() / 60
            ));
        }
    }

    RecoveryResponse {
        recovery_successful: execution.success,
        should_retry_deployment: execution.success && failure.kind.is_transient(),
        recommendations,
    }
}

/// Planning-time conditions fold into recommendations rather than
/// surfacing as HTTP errors.
fn planning_failure_response(failure: &CategorizedFailure, err: &RemedyError) -> RecoveryResponse {
    let mut recommendations = match err {
        RemedyError::NoStrategyFound { severity } => vec![format!(
            "no recovery strategy is configured for severity {severity:?}; \
             register one or add a generic fallback"
        )],
        RemedyError::NoSafeStrategy { .. } => vec![format!(
            "zero-downtime constraints in {} excluded every candidate strategy; \
             manual remediation required",
            failure.context.environment.as_str()
        )],
        other => vec![format!("recovery could not be started: {other}")],
    };
    if let Some(target) = failure.severity.response_target() {
        recommendations.push(format!(
            "respond within {} minutes",
            target.as_secs() / 60
        ));
    }
    RecoveryResponse {
        recovery_successful: false,
        should_retry_deployment: false,
        recommendations,
    }
}
