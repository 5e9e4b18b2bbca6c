//! Normalized CI/CD events.
//!
//! Each platform parser maps its native payload shape into one
//! [`CICDEvent`]. Unrecognized shapes are dropped (`None`), never
//! errors: the caller answers with a no-action response instead of a
//! failure. Parsing happens only after authentication has passed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use remedy_core::Environment;

/// Outcome reported by a build/deploy event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Success,
    Failure,
    InProgress,
    Cancelled,
}

impl DeliveryStatus {
    /// Whether this status should trigger recovery dispatch.
    pub fn indicates_failure(self) -> bool {
        matches!(self, DeliveryStatus::Failure)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" | "passed" => Some(Self::Success),
            "failure" | "failed" | "error" => Some(Self::Failure),
            "in_progress" | "pending" | "running" | "queued" => Some(Self::InProgress),
            "cancelled" | "canceled" | "skipped" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Platform-agnostic webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CICDEvent {
    /// Platform-scoped id used for idempotency.
    pub event_id: String,
    pub platform: String,
    pub environment: Environment,
    pub status: DeliveryStatus,
    /// Branch, tag, or ref the delivery targeted.
    pub git_ref: Option<String>,
    pub commit: Option<String>,
    /// Failing component, when the payload names one (repository,
    /// project, or job).
    pub component: Option<String>,
    /// Free-text evidence carried into categorization: status
    /// descriptions, failed job names, error excerpts.
    pub messages: Vec<String>,
    pub received_at: DateTime<Utc>,
}

fn parse_environment(raw: &str) -> Environment {
    match raw.to_ascii_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "staging" | "stage" => Environment::Staging,
        // Review apps, feature envs, and anything unrecognized are
        // treated as development: never auto-recovered by default.
        _ => Environment::Development,
    }
}

fn str_field<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Map a platform payload into a normalized event.
///
/// Platforms without a dedicated parser go through the generic shape.
pub fn normalize(platform: &str, payload: &Value) -> Option<CICDEvent> {
    match platform {
        "github" => parse_github(payload),
        "gitlab" => parse_gitlab(payload),
        _ => parse_generic(platform, payload),
    }
}

/// GitHub `deployment_status` payloads.
fn parse_github(payload: &Value) -> Option<CICDEvent> {
    let status_obj = payload.get("deployment_status")?;
    let deployment = payload.get("deployment")?;

    let status = DeliveryStatus::parse(str_field(status_obj, "/state")?)?;
    let event_id = status_obj.get("id").map(render_id)?;
    let environment = parse_environment(str_field(deployment, "/environment").unwrap_or(""));

    let mut messages = Vec::new();
    if let Some(description) = str_field(status_obj, "/description") {
        if !description.is_empty() {
            messages.push(description.to_string());
        }
    }

    Some(CICDEvent {
        event_id: format!("github-{event_id}"),
        platform: "github".to_string(),
        environment,
        status,
        git_ref: str_field(deployment, "/ref").map(str::to_string),
        commit: str_field(deployment, "/sha").map(str::to_string),
        component: str_field(payload, "/repository/name").map(str::to_string),
        messages,
        received_at: Utc::now(),
    })
}

/// GitLab pipeline hook payloads (`object_kind: pipeline`).
fn parse_gitlab(payload: &Value) -> Option<CICDEvent> {
    if str_field(payload, "/object_kind") != Some("pipeline") {
        return None;
    }
    let attributes = payload.get("object_attributes")?;

    let status = DeliveryStatus::parse(str_field(attributes, "/status")?)?;
    let event_id = attributes.get("id").map(render_id)?;
    let environment = parse_environment(
        // GitLab reports the deploy environment on the last build when
        // the pipeline carries one.
        str_field(payload, "/builds/0/environment/name")
            .or_else(|| str_field(attributes, "/environment"))
            .unwrap_or(""),
    );

    let mut messages = Vec::new();
    if let Some(builds) = payload.get("builds").and_then(Value::as_array) {
        for build in builds {
            if str_field(build, "/status") == Some("failed") {
                if let Some(name) = str_field(build, "/name") {
                    messages.push(format!("job failed: {name}"));
                }
                if let Some(reason) = str_field(build, "/failure_reason") {
                    messages.push(reason.to_string());
                }
            }
        }
    }

    Some(CICDEvent {
        event_id: format!("gitlab-{event_id}"),
        platform: "gitlab".to_string(),
        environment,
        status,
        git_ref: str_field(attributes, "/ref").map(str::to_string),
        commit: str_field(attributes, "/sha").map(str::to_string),
        component: str_field(payload, "/project/name").map(str::to_string),
        messages,
        received_at: Utc::now(),
    })
}

/// Flat shape for platforms without a dedicated parser:
/// `{event_id, environment, status, ref?, commit?, component?, messages?}`.
fn parse_generic(platform: &str, payload: &Value) -> Option<CICDEvent> {
    let status = DeliveryStatus::parse(str_field(payload, "/status")?)?;
    let event_id = str_field(payload, "/event_id")?;

    let messages = payload
        .get("messages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(CICDEvent {
        event_id: format!("{platform}-{event_id}"),
        platform: platform.to_string(),
        environment: parse_environment(str_field(payload, "/environment").unwrap_or("")),
        status,
        git_ref: str_field(payload, "/ref").map(str::to_string),
        commit: str_field(payload, "/commit").map(str::to_string),
        component: str_field(payload, "/component").map(str::to_string),
        messages,
        received_at: Utc::now(),
    })
}

/// Ids arrive as numbers on some platforms and strings on others.
fn render_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
