//! Injected collaborator contracts.
//!
//! The engine and orchestrator never talk to real infrastructure; they
//! dispatch through these narrow seams. Production wiring supplies real
//! implementations, tests and the daemon's dry-run mode use the scripted
//! fakes in [`fakes`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::failure::CategorizedFailure;
use crate::strategy::{ActionKind, CheckKind};

/// Outcome of one action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Failure,
    /// Transient failure; the engine re-attempts up to the node's retry
    /// bound with exponential backoff.
    Retry,
}

/// Decision delivered by an approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Denied,
}

/// Executes a recovery action of a given kind with node-supplied
/// parameters.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        action: ActionKind,
        params: &BTreeMap<String, serde_json::Value>,
    ) -> ActionStatus;
}

/// Health-predicate lookup: check kind → boolean.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self, kind: CheckKind) -> bool;
}

/// Approval callback for gate nodes. The engine bounds the call with the
/// node's timeout; implementations may block indefinitely.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn request(&self, gate_id: &str, failure: &CategorizedFailure) -> ApprovalDecision;
}

/// Fire-and-forget notification delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Scripted collaborator implementations for tests and dry runs.
pub mod fakes {
    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tracing::info;

    use super::{ActionExecutor, ActionStatus, ApprovalDecision, ApprovalGate, HealthCheck,
        NotificationSink};
    use crate::failure::CategorizedFailure;
    use crate::strategy::{ActionKind, CheckKind};

    /// Returns a scripted sequence of statuses per action kind, then the
    /// fallback status once the script is exhausted.
    pub struct ScriptedExecutor {
        scripts: Mutex<HashMap<ActionKind, VecDeque<ActionStatus>>>,
        fallback: ActionStatus,
        invocations: Mutex<Vec<ActionKind>>,
    }

    impl ScriptedExecutor {
        pub fn succeeding() -> Self {
            Self::with_fallback(ActionStatus::Success)
        }

        pub fn failing() -> Self {
            Self::with_fallback(ActionStatus::Failure)
        }

        pub fn with_fallback(fallback: ActionStatus) -> Self {
            Self {
                scripts: Mutex::new(HashMap::new()),
                fallback,
                invocations: Mutex::new(Vec::new()),
            }
        }

        pub fn script(self, action: ActionKind, statuses: Vec<ActionStatus>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(action, statuses.into());
            self
        }

        /// Every action kind invoked so far, in order.
        pub fn invocations(&self) -> Vec<ActionKind> {
            self.invocations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            action: ActionKind,
            _params: &BTreeMap<String, serde_json::Value>,
        ) -> ActionStatus {
            self.invocations.lock().unwrap().push(action);
            let mut scripts = self.scripts.lock().unwrap();
            scripts
                .get_mut(&action)
                .and_then(|queue| queue.pop_front())
                .unwrap_or(self.fallback)
        }
    }

    /// Per-check results with a default for unscripted checks.
    pub struct StaticHealth {
        results: HashMap<CheckKind, bool>,
        default: bool,
    }

    impl StaticHealth {
        pub fn healthy() -> Self {
            Self {
                results: HashMap::new(),
                default: true,
            }
        }

        pub fn unhealthy() -> Self {
            Self {
                results: HashMap::new(),
                default: false,
            }
        }

        pub fn with(mut self, check: CheckKind, result: bool) -> Self {
            self.results.insert(check, result);
            self
        }
    }

    #[async_trait]
    impl HealthCheck for StaticHealth {
        async fn check(&self, kind: CheckKind) -> bool {
            self.results.get(&kind).copied().unwrap_or(self.default)
        }
    }

    /// Resolves every gate immediately with a fixed decision.
    pub struct InstantGate(pub ApprovalDecision);

    #[async_trait]
    impl ApprovalGate for InstantGate {
        async fn request(&self, _gate_id: &str, _failure: &CategorizedFailure) -> ApprovalDecision {
            self.0
        }
    }

    /// Never resolves; used to exercise gate timeouts.
    pub struct StalledGate;

    #[async_trait]
    impl ApprovalGate for StalledGate {
        async fn request(&self, _gate_id: &str, _failure: &CategorizedFailure) -> ApprovalDecision {
            std::future::pending().await
        }
    }

    /// Records every notification in memory.
    #[derive(Default)]
    pub struct RecordingSink {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    /// Logs notifications through `tracing`; the daemon's default sink.
    pub struct LogSink;

    #[async_trait]
    impl NotificationSink for LogSink {
        async fn notify(&self, message: &str) {
            info!(notification = message, "recovery notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn scripted_executor_plays_script_then_fallback() {
        let exec = ScriptedExecutor::succeeding().script(
            ActionKind::RestartService,
            vec![ActionStatus::Retry, ActionStatus::Failure],
        );
        let params = BTreeMap::new();
        assert_eq!(
            exec.execute(ActionKind::RestartService, &params).await,
            ActionStatus::Retry
        );
        assert_eq!(
            exec.execute(ActionKind::RestartService, &params).await,
            ActionStatus::Failure
        );
        assert_eq!(
            exec.execute(ActionKind::RestartService, &params).await,
            ActionStatus::Success
        );
        assert_eq!(exec.invocations().len(), 3);
    }

    #[tokio::test]
    async fn static_health_uses_overrides() {
        let health = StaticHealth::healthy().with(CheckKind::QueueDepth, false);
        assert!(health.check(CheckKind::HttpHealth).await);
        assert!(!health.check(CheckKind::QueueDepth).await);
    }

    #[tokio::test]
    async fn recording_sink_keeps_messages_in_order() {
        let sink = RecordingSink::new();
        sink.notify("first").await;
        sink.notify("second").await;
        assert_eq!(sink.messages(), vec!["first", "second"]);
    }
}
