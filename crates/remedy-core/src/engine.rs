//! Decision-tree engine: strategy selection and graph traversal.
//!
//! Traversal state (visit budget, recorded steps, manual-intervention
//! flag) lives in a disposable per-execution structure, never in the
//! nodes. The visit budget is shared across FORK branches so a runaway
//! branch cannot extend total work beyond the bound; exhausting it is
//! the only abnormal termination for a cyclic condition graph and always
//! yields [`TraversalOutcome::Timeout`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::{join_all, BoxFuture};
use tracing::{debug, warn};

use crate::collaborators::{ActionExecutor, ActionStatus, ApprovalDecision, ApprovalGate, HealthCheck};
use crate::error::{RemedyError, Result};
use crate::execution::{DecisionPath, PathStep, StepOutcome, TraversalOutcome};
use crate::failure::CategorizedFailure;
use crate::strategy::{ActionKind, DecisionNode, RecoveryStrategy, RetryPolicy, StrategyLibrary};

/// Engine tuning knobs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Maximum node visits per execution, shared across forked branches.
    #[serde(default = "default_visit_budget")]
    pub visit_budget: u32,
    /// Upper bound on a single retry backoff delay.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_visit_budget() -> u32 {
    256
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            visit_budget: default_visit_budget(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Owns the strategy library and executes strategies against categorized
/// failures through the injected collaborators.
pub struct DecisionTreeEngine {
    library: Arc<StrategyLibrary>,
    actions: Arc<dyn ActionExecutor>,
    health: Arc<dyn HealthCheck>,
    approvals: Arc<dyn ApprovalGate>,
    config: EngineConfig,
}

/// Disposable per-execution traversal state.
struct Traversal {
    budget: AtomicU32,
    steps: Mutex<Vec<PathStep>>,
    manual_intervention: AtomicBool,
}

impl Traversal {
    fn new(budget: u32) -> Self {
        Self {
            budget: AtomicU32::new(budget),
            steps: Mutex::new(Vec::new()),
            manual_intervention: AtomicBool::new(false),
        }
    }

    /// Consume one unit of budget; `false` when exhausted.
    fn charge_visit(&self) -> bool {
        self.budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| b.checked_sub(1))
            .is_ok()
    }

    fn record(&self, node: &str, outcome: StepOutcome) {
        self.steps.lock().unwrap().push(PathStep {
            node: node.to_string(),
            outcome,
            at: Utc::now(),
        });
    }
}

impl DecisionTreeEngine {
    pub fn new(
        library: Arc<StrategyLibrary>,
        actions: Arc<dyn ActionExecutor>,
        health: Arc<dyn HealthCheck>,
        approvals: Arc<dyn ApprovalGate>,
        config: EngineConfig,
    ) -> Self {
        Self {
            library,
            actions,
            health,
            approvals,
            config,
        }
    }

    pub fn library(&self) -> &StrategyLibrary {
        &self.library
    }

    /// Select the applicable strategy with the highest recorded success
    /// rate, falling back to the severity-keyed generic strategy.
    ///
    /// # Errors
    ///
    /// `NoStrategyFound` when neither a specific match nor a generic
    /// fallback exists — a configuration gap, surfaced as fatal for the
    /// plan.
    pub fn select_strategy(&self, failure: &CategorizedFailure) -> Result<&RecoveryStrategy> {
        if let Some(best) = self.library.matching(failure).into_iter().next() {
            debug!(
                strategy = %best.id,
                success_rate = best.success_rate,
                "selected specific recovery strategy"
            );
            return Ok(best);
        }
        self.library
            .generic_for(failure.severity)
            .ok_or(RemedyError::NoStrategyFound {
                severity: failure.severity,
            })
    }

    /// Traverse a strategy's node graph from its root and produce the
    /// audit path. Never errors: node-level failures, gate timeouts, and
    /// budget exhaustion are all captured in the path.
    pub async fn execute_strategy(
        &self,
        strategy: &RecoveryStrategy,
        failure: &CategorizedFailure,
    ) -> DecisionPath {
        let traversal = Traversal::new(self.config.visit_budget);
        let outcome = self
            .run_from(strategy, &strategy.root, None, &traversal, failure)
            .await;

        debug!(
            strategy = %strategy.id,
            outcome = ?outcome,
            visited = traversal.steps.lock().unwrap().len(),
            "strategy traversal finished"
        );

        DecisionPath {
            strategy_id: strategy.id.clone(),
            steps: traversal.steps.into_inner().unwrap_or_default(),
            outcome,
            manual_intervention_required: traversal.manual_intervention.load(Ordering::SeqCst),
        }
    }

    /// Walk the graph from `start`, stopping early when `stop_at` (a JOIN
    /// node id, for forked branches) is reached. Boxed because FORK
    /// recurses into sibling traversals.
    fn run_from<'a>(
        &'a self,
        strategy: &'a RecoveryStrategy,
        start: &'a str,
        stop_at: Option<&'a str>,
        traversal: &'a Traversal,
        failure: &'a CategorizedFailure,
    ) -> BoxFuture<'a, TraversalOutcome> {
        Box::pin(async move {
            let mut current: &str = start;
            loop {
                if stop_at == Some(current) {
                    // Branch reached its join point.
                    return TraversalOutcome::Success;
                }

                if !traversal.charge_visit() {
                    warn!(
                        strategy = %strategy.id,
                        node = current,
                        "visit budget exhausted; aborting traversal"
                    );
                    traversal.record(current, StepOutcome::Timeout);
                    return TraversalOutcome::Timeout;
                }

                let Some(node) = strategy.nodes.get(current) else {
                    // Unreachable for validated libraries; recorded
                    // rather than panicking.
                    traversal.record(current, StepOutcome::Failure);
                    return TraversalOutcome::Failure;
                };

                match node {
                    DecisionNode::Condition {
                        check,
                        on_true,
                        on_false,
                    } => {
                        let holds = self.health.check(*check).await;
                        traversal.record(
                            current,
                            if holds {
                                StepOutcome::Success
                            } else {
                                StepOutcome::Failure
                            },
                        );
                        current = if holds { on_true } else { on_false };
                    }

                    DecisionNode::Action {
                        action,
                        params,
                        retry,
                        on_success,
                        on_failure,
                    } => {
                        let succeeded = self.run_action(*action, params, retry).await;
                        traversal.record(
                            current,
                            if succeeded {
                                StepOutcome::Success
                            } else {
                                StepOutcome::Failure
                            },
                        );
                        current = if succeeded { on_success } else { on_failure };
                    }

                    DecisionNode::Gate {
                        gate_id,
                        timeout_secs,
                        on_approved,
                        on_denied,
                    } => {
                        let decision = tokio::time::timeout(
                            Duration::from_secs(*timeout_secs),
                            self.approvals.request(gate_id, failure),
                        )
                        .await;
                        match decision {
                            Ok(ApprovalDecision::Approved) => {
                                traversal.record(current, StepOutcome::Success);
                                current = on_approved;
                            }
                            Ok(ApprovalDecision::Denied) => {
                                traversal
                                    .manual_intervention
                                    .store(true, Ordering::SeqCst);
                                traversal.record(current, StepOutcome::Failure);
                                current = on_denied;
                            }
                            Err(_) => {
                                warn!(gate = %gate_id, "approval gate timed out");
                                traversal
                                    .manual_intervention
                                    .store(true, Ordering::SeqCst);
                                traversal.record(current, StepOutcome::Timeout);
                                current = on_denied;
                            }
                        }
                    }

                    DecisionNode::Fork { branches, join } => {
                        let futures = branches
                            .iter()
                            .map(|b| self.run_from(strategy, b, Some(join), traversal, failure));
                        let results = join_all(futures).await;

                        if results.contains(&TraversalOutcome::Timeout) {
                            traversal.record(current, StepOutcome::Timeout);
                            return TraversalOutcome::Timeout;
                        }
                        // A branch failure is recorded but does not abort
                        // the siblings or the parent traversal.
                        let any_failed = results.contains(&TraversalOutcome::Failure);
                        traversal.record(
                            current,
                            if any_failed {
                                StepOutcome::Failure
                            } else {
                                StepOutcome::Success
                            },
                        );
                        current = join;
                    }

                    DecisionNode::Join { next } => {
                        traversal.record(current, StepOutcome::Success);
                        current = next;
                    }

                    DecisionNode::Wait { delay_ms, next } => {
                        tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                        traversal.record(current, StepOutcome::Success);
                        current = next;
                    }

                    DecisionNode::Terminal { success } => {
                        let outcome = if *success {
                            StepOutcome::Success
                        } else {
                            StepOutcome::Failure
                        };
                        traversal.record(current, outcome);
                        return if *success {
                            TraversalOutcome::Success
                        } else {
                            TraversalOutcome::Failure
                        };
                    }
                }
            }
        })
    }

    /// Run one action node: RETRY results are re-attempted up to the
    /// retry bound with exponential backoff; exceeding the bound counts
    /// as failure.
    async fn run_action(
        &self,
        action: ActionKind,
        params: &BTreeMap<String, serde_json::Value>,
        retry: &RetryPolicy,
    ) -> bool {
        let mut delay_ms = retry.base_delay_ms;
        for attempt in 0..=retry.max_retries {
            match self.actions.execute(action, params).await {
                ActionStatus::Success => return true,
                ActionStatus::Failure => return false,
                ActionStatus::Retry => {
                    if attempt == retry.max_retries {
                        warn!(?action, attempts = attempt + 1, "retry budget exhausted");
                        return false;
                    }
                    debug!(?action, attempt = attempt + 1, delay_ms, "action retrying");
                    tokio::time::sleep(Duration::from_millis(
                        delay_ms.min(self.config.max_backoff_ms),
                    ))
                    .await;
                    delay_ms = delay_ms.saturating_mul(2);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::fakes::{InstantGate, ScriptedExecutor, StalledGate, StaticHealth};
    use crate::failure::{Environment, FailureContext, FailureKind, Severity};
    use crate::strategy::{Applicability, CheckKind};

    fn failure() -> CategorizedFailure {
        CategorizedFailure {
            kind: FailureKind::Data,
            severity: Severity::High,
            confidence: 0.9,
            evidence: vec![],
            context: FailureContext::new(Environment::Production),
        }
    }

    fn node_map(entries: Vec<(&str, DecisionNode)>) -> BTreeMap<String, DecisionNode> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn action_node(action: ActionKind, on_success: &str, on_failure: &str) -> DecisionNode {
        DecisionNode::Action {
            action,
            params: BTreeMap::new(),
            retry: RetryPolicy {
                max_retries: 2,
                base_delay_ms: 1,
            },
            on_success: on_success.to_string(),
            on_failure: on_failure.to_string(),
        }
    }

    fn strategy(root: &str, nodes: BTreeMap<String, DecisionNode>) -> RecoveryStrategy {
        let s = RecoveryStrategy {
            id: "test-strategy".to_string(),
            description: String::new(),
            applies_to: Applicability::default(),
            root: root.to_string(),
            nodes,
            estimated_duration_secs: 10,
            success_rate: 0.8,
        };
        s.validate().unwrap();
        s
    }

    fn engine_with(
        actions: Arc<dyn ActionExecutor>,
        health: Arc<dyn HealthCheck>,
        approvals: Arc<dyn ApprovalGate>,
        budget: u32,
    ) -> DecisionTreeEngine {
        DecisionTreeEngine::new(
            Arc::new(StrategyLibrary::default()),
            actions,
            health,
            approvals,
            EngineConfig {
                visit_budget: budget,
                max_backoff_ms: 10,
            },
        )
    }

    fn default_engine(actions: Arc<dyn ActionExecutor>) -> DecisionTreeEngine {
        engine_with(
            actions,
            Arc::new(StaticHealth::healthy()),
            Arc::new(InstantGate(ApprovalDecision::Approved)),
            64,
        )
    }

    #[tokio::test]
    async fn linear_action_path_succeeds() {
        let s = strategy(
            "restart",
            node_map(vec![
                ("restart", action_node(ActionKind::RestartService, "ok", "fail")),
                ("ok", DecisionNode::Terminal { success: true }),
                ("fail", DecisionNode::Terminal { success: false }),
            ]),
        );
        let engine = default_engine(Arc::new(ScriptedExecutor::succeeding()));

        let path = engine.execute_strategy(&s, &failure()).await;
        assert_eq!(path.outcome, TraversalOutcome::Success);
        assert_eq!(path.steps.len(), 2);
        assert!(!path.manual_intervention_required);
    }

    #[tokio::test]
    async fn retry_is_reattempted_then_succeeds() {
        let exec = ScriptedExecutor::succeeding().script(
            ActionKind::RestartService,
            vec![ActionStatus::Retry, ActionStatus::Retry, ActionStatus::Success],
        );
        let s = strategy(
            "restart",
            node_map(vec![
                ("restart", action_node(ActionKind::RestartService, "ok", "fail")),
                ("ok", DecisionNode::Terminal { success: true }),
                ("fail", DecisionNode::Terminal { success: false }),
            ]),
        );
        let exec = Arc::new(exec);
        let engine = default_engine(exec.clone());

        let path = engine.execute_strategy(&s, &failure()).await;
        assert_eq!(path.outcome, TraversalOutcome::Success);
        assert_eq!(exec.invocations().len(), 3);
    }

    #[tokio::test]
    async fn retry_exhaustion_follows_failure_edge() {
        let exec = ScriptedExecutor::with_fallback(ActionStatus::Retry);
        let s = strategy(
            "restart",
            node_map(vec![
                ("restart", action_node(ActionKind::RestartService, "ok", "fail")),
                ("ok", DecisionNode::Terminal { success: true }),
                ("fail", DecisionNode::Terminal { success: false }),
            ]),
        );
        let engine = default_engine(Arc::new(exec));

        let path = engine.execute_strategy(&s, &failure()).await;
        assert_eq!(path.outcome, TraversalOutcome::Failure);
        assert_eq!(path.steps[0].outcome, StepOutcome::Failure);
    }

    #[tokio::test]
    async fn condition_branches_on_predicate() {
        let s = strategy(
            "probe",
            node_map(vec![
                (
                    "probe",
                    DecisionNode::Condition {
                        check: CheckKind::HttpHealth,
                        on_true: "ok".to_string(),
                        on_false: "fail".to_string(),
                    },
                ),
                ("ok", DecisionNode::Terminal { success: true }),
                ("fail", DecisionNode::Terminal { success: false }),
            ]),
        );

        let healthy = engine_with(
            Arc::new(ScriptedExecutor::succeeding()),
            Arc::new(StaticHealth::healthy()),
            Arc::new(InstantGate(ApprovalDecision::Approved)),
            64,
        );
        let unhealthy = engine_with(
            Arc::new(ScriptedExecutor::succeeding()),
            Arc::new(StaticHealth::unhealthy()),
            Arc::new(InstantGate(ApprovalDecision::Approved)),
            64,
        );

        assert_eq!(
            healthy.execute_strategy(&s, &failure()).await.outcome,
            TraversalOutcome::Success
        );
        assert_eq!(
            unhealthy.execute_strategy(&s, &failure()).await.outcome,
            TraversalOutcome::Failure
        );
    }

    #[tokio::test]
    async fn cyclic_condition_graph_terminates_with_timeout() {
        // on_true loops back to itself; the predicate always holds, so
        // only the visit budget can end the traversal.
        let s = strategy(
            "spin",
            node_map(vec![
                (
                    "spin",
                    DecisionNode::Condition {
                        check: CheckKind::HttpHealth,
                        on_true: "spin".to_string(),
                        on_false: "done".to_string(),
                    },
                ),
                ("done", DecisionNode::Terminal { success: true }),
            ]),
        );
        let engine = engine_with(
            Arc::new(ScriptedExecutor::succeeding()),
            Arc::new(StaticHealth::healthy()),
            Arc::new(InstantGate(ApprovalDecision::Approved)),
            16,
        );

        let path = engine.execute_strategy(&s, &failure()).await;
        assert_eq!(path.outcome, TraversalOutcome::Timeout);
        assert!(path.steps.len() <= 17);
        assert_eq!(path.steps.last().unwrap().outcome, StepOutcome::Timeout);
    }

    #[tokio::test]
    async fn gate_timeout_flags_manual_intervention() {
        let s = strategy(
            "gate",
            node_map(vec![
                (
                    "gate",
                    DecisionNode::Gate {
                        gate_id: "prod-approval".to_string(),
                        timeout_secs: 0,
                        on_approved: "ok".to_string(),
                        on_denied: "fail".to_string(),
                    },
                ),
                ("ok", DecisionNode::Terminal { success: true }),
                ("fail", DecisionNode::Terminal { success: false }),
            ]),
        );
        let engine = engine_with(
            Arc::new(ScriptedExecutor::succeeding()),
            Arc::new(StaticHealth::healthy()),
            Arc::new(StalledGate),
            64,
        );

        let path = engine.execute_strategy(&s, &failure()).await;
        assert_eq!(path.outcome, TraversalOutcome::Failure);
        assert!(path.manual_intervention_required);
        assert_eq!(path.steps[0].outcome, StepOutcome::Timeout);
    }

    #[tokio::test]
    async fn gate_denial_flags_manual_intervention() {
        let s = strategy(
            "gate",
            node_map(vec![
                (
                    "gate",
                    DecisionNode::Gate {
                        gate_id: "prod-approval".to_string(),
                        timeout_secs: 5,
                        on_approved: "ok".to_string(),
                        on_denied: "fail".to_string(),
                    },
                ),
                ("ok", DecisionNode::Terminal { success: true }),
                ("fail", DecisionNode::Terminal { success: false }),
            ]),
        );
        let engine = engine_with(
            Arc::new(ScriptedExecutor::succeeding()),
            Arc::new(StaticHealth::healthy()),
            Arc::new(InstantGate(ApprovalDecision::Denied)),
            64,
        );

        let path = engine.execute_strategy(&s, &failure()).await;
        assert_eq!(path.outcome, TraversalOutcome::Failure);
        assert!(path.manual_intervention_required);
        assert_eq!(path.steps[0].outcome, StepOutcome::Failure);
    }

    #[tokio::test]
    async fn fork_records_branch_failure_without_aborting_siblings() {
        let exec = ScriptedExecutor::succeeding()
            .script(ActionKind::ClearCache, vec![ActionStatus::Failure]);
        let s = strategy(
            "fork",
            node_map(vec![
                (
                    "fork",
                    DecisionNode::Fork {
                        branches: vec!["cache".to_string(), "scale".to_string()],
                        join: "join".to_string(),
                    },
                ),
                ("cache", action_node(ActionKind::ClearCache, "cache-done", "cache-dead")),
                ("cache-done", DecisionNode::Terminal { success: true }),
                ("cache-dead", DecisionNode::Terminal { success: false }),
                ("scale", action_node(ActionKind::ScaleUp, "join", "scale-dead")),
                ("scale-dead", DecisionNode::Terminal { success: false }),
                ("join", DecisionNode::Join { next: "done".to_string() }),
                ("done", DecisionNode::Terminal { success: true }),
            ]),
        );
        let exec = Arc::new(exec);
        let engine = default_engine(exec.clone());

        let path = engine.execute_strategy(&s, &failure()).await;
        // The failing cache branch is recorded but the traversal still
        // reaches the terminal after the join.
        assert_eq!(path.outcome, TraversalOutcome::Success);
        assert!(exec.invocations().contains(&ActionKind::ClearCache));
        assert!(exec.invocations().contains(&ActionKind::ScaleUp));
        let fork_step = path.steps.iter().find(|s| s.node == "fork").unwrap();
        assert_eq!(fork_step.outcome, StepOutcome::Failure);
    }

    #[tokio::test]
    async fn forked_branches_share_the_visit_budget() {
        // Each branch spins on a self-looping condition; with a shared
        // budget the whole execution still times out.
        let s = strategy(
            "fork",
            node_map(vec![
                (
                    "fork",
                    DecisionNode::Fork {
                        branches: vec!["spin-a".to_string(), "spin-b".to_string()],
                        join: "join".to_string(),
                    },
                ),
                (
                    "spin-a",
                    DecisionNode::Condition {
                        check: CheckKind::HttpHealth,
                        on_true: "spin-a".to_string(),
                        on_false: "join".to_string(),
                    },
                ),
                (
                    "spin-b",
                    DecisionNode::Condition {
                        check: CheckKind::HttpHealth,
                        on_true: "spin-b".to_string(),
                        on_false: "join".to_string(),
                    },
                ),
                ("join", DecisionNode::Join { next: "done".to_string() }),
                ("done", DecisionNode::Terminal { success: true }),
            ]),
        );
        let engine = engine_with(
            Arc::new(ScriptedExecutor::succeeding()),
            Arc::new(StaticHealth::healthy()),
            Arc::new(InstantGate(ApprovalDecision::Approved)),
            32,
        );

        let path = engine.execute_strategy(&s, &failure()).await;
        assert_eq!(path.outcome, TraversalOutcome::Timeout);
    }

    #[tokio::test]
    async fn wait_node_continues_unconditionally() {
        let s = strategy(
            "wait",
            node_map(vec![
                (
                    "wait",
                    DecisionNode::Wait {
                        delay_ms: 1,
                        next: "done".to_string(),
                    },
                ),
                ("done", DecisionNode::Terminal { success: true }),
            ]),
        );
        let engine = default_engine(Arc::new(ScriptedExecutor::failing()));

        let path = engine.execute_strategy(&s, &failure()).await;
        assert_eq!(path.outcome, TraversalOutcome::Success);
    }

    #[test]
    fn selection_prefers_specific_over_generic() {
        let specific = RecoveryStrategy {
            id: "db-specific".to_string(),
            description: String::new(),
            applies_to: Applicability {
                kinds: vec![FailureKind::Data],
                ..Default::default()
            },
            root: "done".to_string(),
            nodes: node_map(vec![("done", DecisionNode::Terminal { success: true })]),
            estimated_duration_secs: 10,
            success_rate: 0.7,
        };
        specific.validate().unwrap();
        let generic = RecoveryStrategy {
            id: "generic-high".to_string(),
            description: String::new(),
            applies_to: Applicability {
                kinds: vec![FailureKind::Network],
                ..Default::default()
            },
            root: "done".to_string(),
            nodes: node_map(vec![("done", DecisionNode::Terminal { success: true })]),
            estimated_duration_secs: 10,
            success_rate: 0.5,
        };

        let library = Arc::new(StrategyLibrary {
            strategies: vec![specific.clone(), generic],
            generic_fallbacks: BTreeMap::from([(Severity::High, "generic-high".to_string())]),
        });
        let engine = DecisionTreeEngine::new(
            library,
            Arc::new(ScriptedExecutor::succeeding()),
            Arc::new(StaticHealth::healthy()),
            Arc::new(InstantGate(ApprovalDecision::Approved)),
            EngineConfig::default(),
        );

        let selected = engine.select_strategy(&failure()).unwrap();
        assert_eq!(selected.id, "db-specific");
    }

    #[test]
    fn selection_falls_back_to_generic_then_fails() {
        let generic = RecoveryStrategy {
            id: "generic-high".to_string(),
            description: String::new(),
            applies_to: Applicability {
                kinds: vec![FailureKind::Network],
                ..Default::default()
            },
            root: "done".to_string(),
            nodes: node_map(vec![("done", DecisionNode::Terminal { success: true })]),
            estimated_duration_secs: 10,
            success_rate: 0.5,
        };
        let library = Arc::new(StrategyLibrary {
            strategies: vec![generic],
            generic_fallbacks: BTreeMap::from([(Severity::High, "generic-high".to_string())]),
        });
        let engine = DecisionTreeEngine::new(
            library,
            Arc::new(ScriptedExecutor::succeeding()),
            Arc::new(StaticHealth::healthy()),
            Arc::new(InstantGate(ApprovalDecision::Approved)),
            EngineConfig::default(),
        );

        // Data/High: no specific match, generic fallback for High exists.
        assert_eq!(
            engine.select_strategy(&failure()).unwrap().id,
            "generic-high"
        );

        // Critical has no fallback configured: configuration error.
        let mut critical = failure();
        critical.severity = Severity::Critical;
        assert!(matches!(
            engine.select_strategy(&critical).unwrap_err(),
            RemedyError::NoStrategyFound {
                severity: Severity::Critical
            }
        ));
    }
}
