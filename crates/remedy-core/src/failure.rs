//! Failure taxonomy and categorized-failure records.
//!
//! A raw deployment signal is turned into a [`CategorizedFailure`] by the
//! categorizer. The categorized record is read-only thereafter and is
//! identified by a stable [`FailureSignature`] used to deduplicate
//! concurrent recovery attempts for the same underlying problem.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deployment environment of the failing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Closed set of failure kinds recognized by the categorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Infrastructure,
    Configuration,
    Dependency,
    Resource,
    Application,
    Data,
    Security,
    Network,
    Timing,
    HumanError,
}

impl FailureKind {
    /// Kinds that typically clear on their own once the environment
    /// stabilizes. A successful recovery from one of these makes an
    /// immediate redeploy reasonable.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureKind::Network
                | FailureKind::Timing
                | FailureKind::Dependency
                | FailureKind::Resource
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Infrastructure => "infrastructure",
            FailureKind::Configuration => "configuration",
            FailureKind::Dependency => "dependency",
            FailureKind::Resource => "resource",
            FailureKind::Application => "application",
            FailureKind::Data => "data",
            FailureKind::Security => "security",
            FailureKind::Network => "network",
            FailureKind::Timing => "timing",
            FailureKind::HumanError => "human_error",
        }
    }
}

/// Severity levels, ordered so that `Info < Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Advisory response-time target for operators. `None` means
    /// "as needed".
    pub fn response_target(&self) -> Option<Duration> {
        match self {
            Severity::Critical => Some(Duration::ZERO),
            Severity::High => Some(Duration::from_secs(15 * 60)),
            Severity::Medium => Some(Duration::from_secs(30 * 60)),
            Severity::Low => Some(Duration::from_secs(2 * 60 * 60)),
            Severity::Info => None,
        }
    }
}

/// Immutable context attached to one incoming failure signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureContext {
    pub environment: Environment,
    pub occurred_at: DateTime<Utc>,
    pub affected_users: u64,
    pub component: Option<String>,
}

impl FailureContext {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            occurred_at: Utc::now(),
            affected_users: 0,
            component: None,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_affected_users(mut self, count: u64) -> Self {
        self.affected_users = count;
        self
    }
}

/// Stable deduplication key: SHA-256 over (kind, component, environment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailureSignature(String);

impl FailureSignature {
    pub fn compute(kind: FailureKind, component: Option<&str>, environment: Environment) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(component.unwrap_or("-").as_bytes());
        hasher.update(b"|");
        hasher.update(environment.as_str().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for FailureSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of the categorizer. Read-only after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedFailure {
    pub kind: FailureKind,
    pub severity: Severity,
    /// Confidence in the classification, in `[0, 1]`.
    pub confidence: f64,
    /// Which patterns/metrics triggered the classification.
    pub evidence: Vec<String>,
    pub context: FailureContext,
}

impl CategorizedFailure {
    pub fn signature(&self) -> FailureSignature {
        FailureSignature::compute(
            self.kind,
            self.context.component.as_deref(),
            self.context.environment,
        )
    }
}
