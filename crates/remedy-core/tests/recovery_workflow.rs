//! End-to-end recovery workflow: YAML config -> categorization ->
//! planning -> seven-phase execution, through the public API only.

use std::collections::BTreeMap;
use std::sync::Arc;

use remedy_core::collaborators::fakes::{
    InstantGate, RecordingSink, ScriptedExecutor, StaticHealth,
};
use remedy_core::{
    ActionExecutor, ApprovalDecision, DecisionTreeEngine, Environment, FailureContext,
    FailureKind, FailureSignals, HealthCheck, OrchestratorSettings, RecoveryDisposition,
    RecoveryOrchestrator, RemedyConfig, RemedyError, Severity, TraversalOutcome,
    ValidationSettings,
};

const CONFIG: &str = r#"
library:
  strategies:
    - id: db-failover
      description: shift traffic away from the failing database primary
      applies_to:
        kinds: [data]
        severities: [high, critical]
        environments: [production, staging]
      root: failover
      nodes:
        failover:
          type: action
          action: failover_traffic
          retry: { max_retries: 2, base_delay_ms: 1 }
          on_success: verify
          on_failure: dead
        verify:
          type: condition
          check: database_connectivity
          on_true: ok
          on_false: dead
        ok: { type: terminal, success: true }
        dead: { type: terminal, success: false }
      estimated_duration_secs: 120
      success_rate: 0.85
    - id: cache-reset
      description: clear caches and scale out while the pool recovers
      applies_to:
        kinds: [data]
      root: fork
      nodes:
        fork:
          type: fork
          branches: [cache, scale]
          join: join
        cache:
          type: action
          action: clear_cache
          on_success: join
          on_failure: cache-dead
        cache-dead: { type: terminal, success: false }
        scale:
          type: action
          action: scale_up
          on_success: join
          on_failure: scale-dead
        scale-dead: { type: terminal, success: false }
        join: { type: join, next: settle }
        settle: { type: wait, delay_ms: 1, next: ok }
        ok: { type: terminal, success: true }
      estimated_duration_secs: 60
      success_rate: 0.6
  generic_fallbacks:
    high: cache-reset
"#;

struct Harness {
    config: RemedyConfig,
    orchestrator: RecoveryOrchestrator,
    sink: Arc<RecordingSink>,
}

fn harness(executor: ScriptedExecutor, health: StaticHealth) -> Harness {
    let config = RemedyConfig::from_yaml(CONFIG).unwrap();
    let actions: Arc<dyn ActionExecutor> = Arc::new(executor);
    let health: Arc<dyn HealthCheck> = Arc::new(health);
    let sink = Arc::new(RecordingSink::new());

    let engine = DecisionTreeEngine::new(
        Arc::new(config.library.clone()),
        actions.clone(),
        health.clone(),
        Arc::new(InstantGate(ApprovalDecision::Approved)),
        config.engine.clone(),
    );
    let orchestrator = RecoveryOrchestrator::new(
        engine,
        config.constraints.clone(),
        actions,
        health,
        sink.clone(),
        OrchestratorSettings {
            validation: ValidationSettings {
                checks: vec![remedy_core::CheckKind::HttpHealth],
                timeout_secs: 0,
                poll_interval_ms: 1,
            },
            ..Default::default()
        },
    );
    Harness {
        config,
        orchestrator,
        sink,
    }
}

fn production_db_signals() -> FailureSignals {
    FailureSignals {
        error_messages: vec!["Database connection timeout".to_string()],
        log_lines: vec!["ERROR: Connection pool exhausted".to_string()],
        metrics: BTreeMap::from([("error_rate".to_string(), 25.0)]),
        status_codes: vec![503],
    }
}

#[tokio::test]
async fn categorized_production_failure_recovers_through_primary_strategy() {
    let h = harness(ScriptedExecutor::succeeding(), StaticHealth::healthy());

    let categorizer = h.config.categorizer().unwrap();
    let failure = categorizer.categorize(
        &production_db_signals(),
        FailureContext::new(Environment::Production).with_component("payments-db"),
    );
    assert_eq!(failure.kind, FailureKind::Data);
    assert_eq!(failure.severity, Severity::High);
    assert!(failure.confidence > 0.0);

    let plan = h.orchestrator.create_recovery_plan(&failure).unwrap();
    assert_eq!(plan.primary, "db-failover");
    assert_eq!(plan.fallbacks, vec!["cache-reset".to_string()]);
    assert!(plan.constraints.zero_downtime_required());

    let RecoveryDisposition::Executed(execution) =
        h.orchestrator.handle_failure(failure).await.unwrap()
    else {
        panic!("expected an executed recovery");
    };
    assert!(execution.success);
    assert_eq!(execution.paths.len(), 1);
    assert_eq!(execution.paths[0].strategy_id, "db-failover");
    assert!(h.sink.messages().iter().any(|m| m.contains("recovered")));
}

#[tokio::test]
async fn stabilization_escalates_to_fork_join_fallback() {
    // Primary failover keeps failing; the fork/join fallback succeeds.
    let executor = ScriptedExecutor::succeeding().script(
        remedy_core::ActionKind::FailoverTraffic,
        vec![
            remedy_core::ActionStatus::Failure,
            remedy_core::ActionStatus::Failure,
        ],
    );
    let h = harness(executor, StaticHealth::healthy());

    let categorizer = h.config.categorizer().unwrap();
    let failure = categorizer.categorize(
        &production_db_signals(),
        FailureContext::new(Environment::Production).with_component("payments-db"),
    );

    let RecoveryDisposition::Executed(execution) =
        h.orchestrator.handle_failure(failure).await.unwrap()
    else {
        panic!("expected an executed recovery");
    };

    assert!(execution.success);
    assert_eq!(execution.metrics.fallbacks_used, 1);
    assert_eq!(execution.paths.len(), 2);
    assert_eq!(execution.paths[0].outcome, TraversalOutcome::Failure);
    assert_eq!(execution.paths[1].strategy_id, "cache-reset");
    assert_eq!(execution.paths[1].outcome, TraversalOutcome::Success);
}

#[tokio::test]
async fn no_safe_strategy_when_zero_downtime_excludes_all_candidates() {
    // Rewrite the library so the only Data/High strategy restarts the
    // service, which is not downtime-safe; production requires zero
    // downtime, so planning must fail rather than downgrade.
    let doc = CONFIG
        .replace("action: failover_traffic", "action: restart_service")
        .replace("action: clear_cache", "action: restart_pods");
    let config = RemedyConfig::from_yaml(&doc).unwrap();

    let actions: Arc<dyn ActionExecutor> = Arc::new(ScriptedExecutor::succeeding());
    let health: Arc<dyn HealthCheck> = Arc::new(StaticHealth::healthy());
    let engine = DecisionTreeEngine::new(
        Arc::new(config.library.clone()),
        actions.clone(),
        health.clone(),
        Arc::new(InstantGate(ApprovalDecision::Approved)),
        config.engine.clone(),
    );
    let orchestrator = RecoveryOrchestrator::new(
        engine,
        config.constraints.clone(),
        actions,
        health,
        Arc::new(RecordingSink::new()),
        OrchestratorSettings::default(),
    );

    let categorizer = config.categorizer().unwrap();
    let failure = categorizer.categorize(
        &production_db_signals(),
        FailureContext::new(Environment::Production),
    );

    let err = orchestrator.handle_failure(failure.clone()).await.unwrap_err();
    assert!(matches!(err, RemedyError::NoSafeStrategy { .. }));

    // Development tolerates downtime, so the same library plans fine.
    let dev_failure = categorizer.categorize(
        &production_db_signals(),
        FailureContext::new(Environment::Development),
    );
    assert!(orchestrator.create_recovery_plan(&dev_failure).is_ok());
}

#[tokio::test]
async fn validation_failure_marks_execution_failed() {
    let h = harness(
        ScriptedExecutor::succeeding(),
        StaticHealth::healthy().with(remedy_core::CheckKind::HttpHealth, false),
    );

    let categorizer = h.config.categorizer().unwrap();
    let failure = categorizer.categorize(
        &production_db_signals(),
        FailureContext::new(Environment::Production),
    );

    let RecoveryDisposition::Executed(execution) =
        h.orchestrator.handle_failure(failure).await.unwrap()
    else {
        panic!("expected an executed recovery");
    };
    // The strategy traversal succeeded but validation did not.
    assert_eq!(execution.paths[0].outcome, TraversalOutcome::Success);
    assert!(!execution.success);
}
