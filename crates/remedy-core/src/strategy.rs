//! Recovery strategies and the decision-node arena.
//!
//! A strategy is configuration data: a flat map of node id → node with
//! edges expressed as ids, never embedded references. Traversal state
//! (visit counts, current position) lives in a disposable per-execution
//! structure in the engine, which is what makes the visit-budget cycle
//! guard possible.
//!
//! Action and check kinds are closed enumerations resolved at startup;
//! unknown kinds are rejected when the configuration is loaded, not at
//! execution time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RemedyError, Result};
use crate::failure::{CategorizedFailure, Environment, FailureKind, Severity};

/// Closed set of recovery action kinds dispatched through the injected
/// action executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    RestartService,
    RestartPods,
    RollbackDeployment,
    ScaleUp,
    ScaleDown,
    ClearCache,
    FlushConnections,
    FailoverTraffic,
    BlueGreenCutover,
    CanaryShift,
    RebuildIndex,
    RotateCredentials,
    TuneAutoscaler,
    ReleaseResources,
}

impl ActionKind {
    /// Whether this action is certified not to interrupt service. Under a
    /// zero-downtime constraint only strategies composed entirely of
    /// downtime-safe actions are eligible.
    pub fn is_downtime_safe(&self) -> bool {
        matches!(
            self,
            ActionKind::ScaleUp
                | ActionKind::ClearCache
                | ActionKind::FailoverTraffic
                | ActionKind::BlueGreenCutover
                | ActionKind::CanaryShift
                | ActionKind::TuneAutoscaler
                | ActionKind::ReleaseResources
        )
    }
}

/// Closed set of health-check kinds resolved through the injected
/// health-predicate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    HttpHealth,
    DatabaseConnectivity,
    CacheWarm,
    QueueDepth,
    ErrorRateRecovered,
    ReplicationCaughtUp,
    SyntheticTransaction,
}

/// Bounded retry policy for action nodes. Delay doubles per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 100,
        }
    }
}

/// Node identifier within one strategy's arena.
pub type NodeId = String;

/// Tagged decision-node variants. Nodes are immutable; execution state is
/// kept in the traversal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionNode {
    /// Evaluate the injected predicate; branch on the boolean result.
    Condition {
        check: CheckKind,
        on_true: NodeId,
        on_false: NodeId,
    },
    /// Invoke the injected action executor, retrying with exponential
    /// backoff while it reports RETRY.
    Action {
        action: ActionKind,
        #[serde(default)]
        params: BTreeMap<String, serde_json::Value>,
        #[serde(default)]
        retry: RetryPolicy,
        on_success: NodeId,
        on_failure: NodeId,
    },
    /// Suspend until an approval callback resolves or the timeout elapses.
    /// Timeout follows the denied edge and flags manual intervention.
    Gate {
        gate_id: String,
        timeout_secs: u64,
        on_approved: NodeId,
        on_denied: NodeId,
    },
    /// Launch the listed branches concurrently; continue at `join` once
    /// every branch has reached it (or a terminal).
    Fork { branches: Vec<NodeId>, join: NodeId },
    /// Merge point for forked branches.
    Join { next: NodeId },
    /// Bounded delay, then continue unconditionally.
    Wait { delay_ms: u64, next: NodeId },
    /// End of traversal.
    Terminal { success: bool },
}

impl DecisionNode {
    fn outgoing_edges(&self) -> Vec<&NodeId> {
        match self {
            DecisionNode::Condition {
                on_true, on_false, ..
            } => vec![on_true, on_false],
            DecisionNode::Action {
                on_success,
                on_failure,
                ..
            } => vec![on_success, on_failure],
            DecisionNode::Gate {
                on_approved,
                on_denied,
                ..
            } => vec![on_approved, on_denied],
            DecisionNode::Fork { branches, join } => {
                let mut edges: Vec<&NodeId> = branches.iter().collect();
                edges.push(join);
                edges
            }
            DecisionNode::Join { next } => vec![next],
            DecisionNode::Wait { next, .. } => vec![next],
            DecisionNode::Terminal { .. } => Vec::new(),
        }
    }
}

/// Applicability filter for a strategy. An empty list means "matches any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    #[serde(default)]
    pub kinds: Vec<FailureKind>,
    #[serde(default)]
    pub severities: Vec<Severity>,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub components: Vec<String>,
}

impl Applicability {
    pub fn matches(&self, failure: &CategorizedFailure) -> bool {
        let kind_ok = self.kinds.is_empty() || self.kinds.contains(&failure.kind);
        let severity_ok =
            self.severities.is_empty() || self.severities.contains(&failure.severity);
        let env_ok = self.environments.is_empty()
            || self.environments.contains(&failure.context.environment);
        let component_ok = self.components.is_empty()
            || failure
                .context
                .component
                .as_ref()
                .map(|c| self.components.iter().any(|allowed| allowed == c))
                .unwrap_or(false);
        kind_ok && severity_ok && env_ok && component_ok
    }
}

/// An automated recovery procedure: an arena of decision nodes plus the
/// metadata used for selection. Immutable at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStrategy {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub applies_to: Applicability,
    pub root: NodeId,
    pub nodes: BTreeMap<NodeId, DecisionNode>,
    #[serde(default)]
    pub estimated_duration_secs: u64,
    /// Historical success rate in `[0, 1]`, used to rank candidates.
    pub success_rate: f64,
}

impl RecoveryStrategy {
    /// True when every action node in the arena is downtime-safe.
    pub fn is_downtime_safe(&self) -> bool {
        self.nodes.values().all(|node| match node {
            DecisionNode::Action { action, .. } => action.is_downtime_safe(),
            _ => true,
        })
    }

    /// Structural validation: the root and every edge must resolve, and
    /// at least one terminal node must exist. Cyclic graphs are allowed
    /// (the engine's visit budget bounds them) but dangling ids are not.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| RemedyError::InvalidStrategy {
            id: self.id.clone(),
            reason,
        };

        if self.nodes.is_empty() {
            return Err(invalid("strategy has no nodes".to_string()));
        }
        if !self.nodes.contains_key(&self.root) {
            return Err(invalid(format!("root node '{}' does not exist", self.root)));
        }
        for (id, node) in &self.nodes {
            for edge in node.outgoing_edges() {
                if !self.nodes.contains_key(edge) {
                    return Err(invalid(format!(
                        "node '{id}' references missing node '{edge}'"
                    )));
                }
            }
        }
        if !self
            .nodes
            .values()
            .any(|n| matches!(n, DecisionNode::Terminal { .. }))
        {
            return Err(invalid("strategy has no terminal node".to_string()));
        }
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(invalid(format!(
                "success_rate {} outside [0, 1]",
                self.success_rate
            )));
        }
        Ok(())
    }
}

/// The loaded strategy library: specific strategies plus severity-keyed
/// generic fallbacks. Read-only after load; shared across executions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyLibrary {
    pub strategies: Vec<RecoveryStrategy>,
    /// Generic fallback strategy id per severity, consulted when no
    /// specific strategy matches a failure.
    #[serde(default)]
    pub generic_fallbacks: BTreeMap<Severity, String>,
}

impl StrategyLibrary {
    /// Validate every strategy, uniqueness of ids, and that each generic
    /// fallback references a real strategy.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for strategy in &self.strategies {
            strategy.validate()?;
            if !seen.insert(&strategy.id) {
                return Err(RemedyError::InvalidStrategy {
                    id: strategy.id.clone(),
                    reason: "duplicate strategy id".to_string(),
                });
            }
        }
        for id in self.generic_fallbacks.values() {
            if !seen.contains(id) {
                return Err(RemedyError::UnknownStrategyId(id.clone()));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RecoveryStrategy> {
        self.strategies.iter().find(|s| s.id == id)
    }

    /// All strategies applicable to the failure, sorted by descending
    /// success rate.
    pub fn matching(&self, failure: &CategorizedFailure) -> Vec<&RecoveryStrategy> {
        let mut matches: Vec<&RecoveryStrategy> = self
            .strategies
            .iter()
            .filter(|s| s.applies_to.matches(failure))
            .collect();
        matches.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches
    }

    pub fn generic_for(&self, severity: Severity) -> Option<&RecoveryStrategy> {
        self.generic_fallbacks
            .get(&severity)
            .and_then(|id| self.get(id))
    }
}
