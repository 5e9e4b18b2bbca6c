//! Recovery orchestration: plan creation and the seven-phase lifecycle.
//!
//! Phases within one execution are strictly ordered; no phase begins
//! before the previous phase's outcome is recorded. Cleanup runs on
//! every exit path. The in-flight-by-signature registry is the only
//! mutable shared state: registration is compare-and-register under one
//! lock so two executions can never start for the same signature
//! concurrently.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collaborators::{ActionExecutor, ActionStatus, HealthCheck, NotificationSink};
use crate::constraints::{ConstraintPolicy, RecoveryConstraints};
use crate::engine::DecisionTreeEngine;
use crate::error::{RemedyError, Result};
use crate::execution::{
    write_execution_artifact, Phase, PhaseRecord, PhaseStatus, RecoveryExecution, RecoveryMetrics,
};
use crate::failure::{CategorizedFailure, FailureSignature};
use crate::metrics::METRICS;
use crate::strategy::{ActionKind, CheckKind};

/// Validation-phase settings: every configured check must pass within
/// the timeout for the execution to be marked successful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    pub checks: Vec<CheckKind>,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            checks: vec![CheckKind::HttpHealth, CheckKind::ErrorRateRecovered],
            timeout_secs: 60,
            poll_interval_ms: 500,
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    #[serde(default)]
    pub validation: ValidationSettings,
    /// Best-effort tuning actions run after a validated recovery.
    #[serde(default = "default_optimization_actions")]
    pub optimization_actions: Vec<ActionKind>,
    /// Actions releasing temporary resources; run on every exit path.
    #[serde(default = "default_cleanup_actions")]
    pub cleanup_actions: Vec<ActionKind>,
    /// Directory for append-only execution artifacts. `None` disables
    /// persistence (tests, dry runs).
    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,
}

fn default_optimization_actions() -> Vec<ActionKind> {
    vec![ActionKind::TuneAutoscaler]
}

fn default_cleanup_actions() -> Vec<ActionKind> {
    vec![ActionKind::ReleaseResources]
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            validation: ValidationSettings::default(),
            optimization_actions: default_optimization_actions(),
            cleanup_actions: default_cleanup_actions(),
            artifact_dir: None,
        }
    }
}

/// A recovery attempt: the failure, the selected strategies, and the
/// resolved environment constraints. Created once, consumed by
/// [`RecoveryOrchestrator::execute_recovery_plan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPlan {
    pub failure: CategorizedFailure,
    pub primary: String,
    /// Fallback strategy ids, ordered by descending success rate.
    pub fallbacks: Vec<String>,
    pub constraints: RecoveryConstraints,
    pub created_at: DateTime<Utc>,
}

/// How the orchestrator disposed of one incoming failure signal.
#[derive(Debug)]
pub enum RecoveryDisposition {
    /// A new execution ran to completion (successfully or not).
    Executed(Box<RecoveryExecution>),
    /// An execution with the same failure signature was already in
    /// flight; this signal was attached to it as additional evidence.
    Coalesced { signature: FailureSignature },
}

/// Per-execution registry entry.
struct InFlight {
    coalesced: AtomicU32,
    cancelled: AtomicBool,
    validation_started: AtomicBool,
}

impl InFlight {
    fn new() -> Self {
        Self {
            coalesced: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
            validation_started: AtomicBool::new(false),
        }
    }
}

/// Drives a categorized failure through the recovery lifecycle.
pub struct RecoveryOrchestrator {
    engine: DecisionTreeEngine,
    constraints: ConstraintPolicy,
    actions: Arc<dyn ActionExecutor>,
    health: Arc<dyn HealthCheck>,
    notifications: Arc<dyn NotificationSink>,
    settings: OrchestratorSettings,
    in_flight: Mutex<HashMap<String, Arc<InFlight>>>,
}

impl RecoveryOrchestrator {
    pub fn new(
        engine: DecisionTreeEngine,
        constraints: ConstraintPolicy,
        actions: Arc<dyn ActionExecutor>,
        health: Arc<dyn HealthCheck>,
        notifications: Arc<dyn NotificationSink>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            engine,
            constraints,
            actions,
            health,
            notifications,
            settings,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Select primary and fallback strategies for a failure and resolve
    /// its environment constraints.
    ///
    /// # Errors
    ///
    /// * `NoSafeStrategy` — a zero-downtime constraint excluded every
    ///   candidate. The constraint is reported, never silently downgraded.
    /// * `NoStrategyFound` — no candidate matched and no generic fallback
    ///   exists for the failure's severity.
    pub fn create_recovery_plan(&self, failure: &CategorizedFailure) -> Result<RecoveryPlan> {
        let constraints = self.constraints.resolve(failure.context.environment);
        let library = self.engine.library();

        let mut candidates = library.matching(failure);
        if let Some(generic) = library.generic_for(failure.severity) {
            if !candidates.iter().any(|s| s.id == generic.id) {
                // Lowest priority: consulted only after every specific match.
                candidates.push(generic);
            }
        }

        if candidates.is_empty() {
            return Err(RemedyError::NoStrategyFound {
                severity: failure.severity,
            });
        }

        if constraints.zero_downtime_required() {
            let before = candidates.len();
            candidates.retain(|s| s.is_downtime_safe());
            if candidates.is_empty() {
                warn!(
                    signature = %failure.signature().short(),
                    excluded = before,
                    "zero-downtime constraint excluded every candidate strategy"
                );
                return Err(RemedyError::NoSafeStrategy {
                    signature: failure.signature().as_str().to_string(),
                });
            }
        }

        let primary = candidates[0].id.clone();
        let fallbacks = candidates[1..].iter().map(|s| s.id.clone()).collect();

        debug!(primary = %primary, "recovery plan created");
        Ok(RecoveryPlan {
            failure: failure.clone(),
            primary,
            fallbacks,
            constraints,
            created_at: Utc::now(),
        })
    }

    /// Plan and execute in one step.
    pub async fn handle_failure(
        &self,
        failure: CategorizedFailure,
    ) -> Result<RecoveryDisposition> {
        let signature = failure.signature();

        // Compare-and-register before planning so a coalesced signal is
        // never reported as a planning failure.
        let Some(entry) = self.register(&signature).await else {
            info!(signature = %signature.short(), "signal coalesced onto in-flight execution");
            METRICS.inc_signals_coalesced();
            return Ok(RecoveryDisposition::Coalesced { signature });
        };

        let plan = match self.create_recovery_plan(&failure) {
            Ok(plan) => plan,
            Err(err) => {
                self.unregister(&signature).await;
                return Err(err);
            }
        };

        let result = self.run_phases(plan, &entry).await;
        self.unregister(&signature).await;
        result.map(|execution| RecoveryDisposition::Executed(Box::new(execution)))
    }

    /// Execute an already-created plan, with the same signature
    /// deduplication as [`handle_failure`].
    pub async fn execute_recovery_plan(&self, plan: RecoveryPlan) -> Result<RecoveryDisposition> {
        let signature = plan.failure.signature();
        let Some(entry) = self.register(&signature).await else {
            METRICS.inc_signals_coalesced();
            return Ok(RecoveryDisposition::Coalesced { signature });
        };

        let result = self.run_phases(plan, &entry).await;
        self.unregister(&signature).await;
        result.map(|execution| RecoveryDisposition::Executed(Box::new(execution)))
    }

    /// Request cancellation of an in-flight execution. Honored only
    /// before the Validation phase commits; returns whether the request
    /// was accepted.
    pub async fn cancel(&self, signature: &FailureSignature) -> bool {
        let map = self.in_flight.lock().await;
        match map.get(signature.as_str()) {
            Some(entry) if !entry.validation_started.load(Ordering::SeqCst) => {
                entry.cancelled.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    /// Atomically register a signature. `None` means an execution is
    /// already in flight; the caller's signal was attached to it.
    async fn register(&self, signature: &FailureSignature) -> Option<Arc<InFlight>> {
        let mut map = self.in_flight.lock().await;
        if let Some(existing) = map.get(signature.as_str()) {
            existing.coalesced.fetch_add(1, Ordering::SeqCst);
            return None;
        }
        let entry = Arc::new(InFlight::new());
        map.insert(signature.as_str().to_string(), entry.clone());
        Some(entry)
    }

    async fn unregister(&self, signature: &FailureSignature) {
        self.in_flight.lock().await.remove(signature.as_str());
    }

    async fn run_phases(
        &self,
        plan: RecoveryPlan,
        entry: &Arc<InFlight>,
    ) -> Result<RecoveryExecution> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let signature = plan.failure.signature();

        let mut phases: Vec<PhaseRecord> = Vec::new();
        let mut paths = Vec::new();
        let mut metrics = RecoveryMetrics {
            users_affected: plan.failure.context.affected_users,
            ..Default::default()
        };
        let record = |phases: &mut Vec<PhaseRecord>, phase, status| {
            phases.push(PhaseRecord {
                phase,
                status,
                completed_at: Utc::now(),
            });
        };

        // Phase 1: Preparation.
        METRICS.inc_executions_started();
        self.notifications
            .notify(&format!(
                "recovery started: {:?}/{:?} in {} (signature {})",
                plan.failure.kind,
                plan.failure.severity,
                plan.failure.context.environment.as_str(),
                signature.short(),
            ))
            .await;
        record(&mut phases, Phase::Preparation, PhaseStatus::Succeeded);

        let mut recovered = false;
        let mut cancelled = entry.cancelled.load(Ordering::SeqCst);

        // Phase 2: Immediate Response — primary strategy.
        if cancelled {
            record(&mut phases, Phase::ImmediateResponse, PhaseStatus::Skipped);
        } else if let Some(primary) = self.engine.library().get(&plan.primary) {
            let path = self.engine.execute_strategy(primary, &plan.failure).await;
            if path.manual_intervention_required {
                metrics.manual_interventions += 1;
            }
            recovered = path.succeeded();
            paths.push(path);
            record(
                &mut phases,
                Phase::ImmediateResponse,
                if recovered {
                    PhaseStatus::Succeeded
                } else {
                    PhaseStatus::Failed
                },
            );
        } else {
            // Plan referenced a strategy the library no longer holds;
            // validated configs make this unreachable.
            warn!(strategy = %plan.primary, "planned primary strategy missing from library");
            record(&mut phases, Phase::ImmediateResponse, PhaseStatus::Failed);
        }

        cancelled = cancelled || entry.cancelled.load(Ordering::SeqCst);

        // Phase 3: Stabilization — fallbacks in order until one succeeds.
        if cancelled || recovered {
            record(&mut phases, Phase::Stabilization, PhaseStatus::Skipped);
        } else {
            for fallback_id in &plan.fallbacks {
                let Some(strategy) = self.engine.library().get(fallback_id) else {
                    continue;
                };
                info!(strategy = %fallback_id, "escalating to fallback strategy");
                metrics.fallbacks_used += 1;
                let path = self.engine.execute_strategy(strategy, &plan.failure).await;
                if path.manual_intervention_required {
                    metrics.manual_interventions += 1;
                }
                recovered = path.succeeded();
                paths.push(path);
                if recovered {
                    break;
                }
            }
            record(
                &mut phases,
                Phase::Stabilization,
                if recovered {
                    PhaseStatus::Succeeded
                } else {
                    PhaseStatus::Failed
                },
            );
            if !recovered {
                // All fallbacks exhausted: reported, never retried further.
                metrics.manual_interventions += 1;
            }
        }

        cancelled = cancelled || entry.cancelled.load(Ordering::SeqCst);

        // Phase 4: Validation. Once started, cancellation is no longer
        // honored — the remaining phases always run to completion.
        let mut success = false;
        if cancelled || !recovered {
            record(&mut phases, Phase::Validation, PhaseStatus::Skipped);
        } else {
            entry.validation_started.store(true, Ordering::SeqCst);
            let validated = self.run_validation().await;
            if !validated {
                warn!(
                    signature = %signature.short(),
                    "validation failed after apparently successful recovery"
                );
            }
            success = validated;
            record(
                &mut phases,
                Phase::Validation,
                if validated {
                    PhaseStatus::Succeeded
                } else {
                    PhaseStatus::Failed
                },
            );
        }

        // Phase 5: Optimization — best effort, never flips the success flag.
        if success {
            self.run_actions_best_effort(&self.settings.optimization_actions, "optimization")
                .await;
            record(&mut phases, Phase::Optimization, PhaseStatus::Succeeded);
        } else {
            record(&mut phases, Phase::Optimization, PhaseStatus::Skipped);
        }

        // Phase 6: Cleanup — always runs, even when earlier phases failed.
        self.run_actions_best_effort(&self.settings.cleanup_actions, "cleanup")
            .await;
        record(&mut phases, Phase::Cleanup, PhaseStatus::Succeeded);

        // Phase 7: Post-Recovery — finalize and persist.
        metrics.duration_ms = clock.elapsed().as_millis() as u64;
        if success {
            metrics.components_recovered = 1;
            METRICS.inc_executions_recovered();
        } else {
            METRICS.inc_executions_failed();
        }
        record(&mut phases, Phase::PostRecovery, PhaseStatus::Succeeded);

        let execution = RecoveryExecution {
            id: Uuid::new_v4(),
            signature: signature.as_str().to_string(),
            failure: plan.failure,
            success,
            phases,
            paths,
            metrics,
            coalesced_signals: entry.coalesced.load(Ordering::SeqCst),
            cancelled,
            started_at,
            finished_at: Utc::now(),
        };

        if let Some(dir) = &self.settings.artifact_dir {
            write_execution_artifact(&execution, dir)?;
        }

        self.notifications
            .notify(&format!(
                "recovery finished: {} (signature {}, {} ms)",
                if success { "recovered" } else { "failed" },
                signature.short(),
                execution.metrics.duration_ms,
            ))
            .await;

        Ok(execution)
    }

    /// Poll the configured health checks until they all pass or the
    /// bounded timeout elapses.
    async fn run_validation(&self) -> bool {
        let checks = &self.settings.validation.checks;
        if checks.is_empty() {
            return true;
        }
        let deadline =
            Instant::now() + Duration::from_secs(self.settings.validation.timeout_secs);
        let poll = Duration::from_millis(self.settings.validation.poll_interval_ms);

        loop {
            let mut all_passed = true;
            for check in checks {
                if !self.health.check(*check).await {
                    debug!(?check, "validation check failed");
                    all_passed = false;
                    break;
                }
            }
            if all_passed {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Run independent actions concurrently; log failures without
    /// affecting the execution outcome.
    async fn run_actions_best_effort(&self, actions: &[ActionKind], phase: &str) {
        let empty = std::collections::BTreeMap::new();
        let futures = actions
            .iter()
            .map(|action| async { (*action, self.actions.execute(*action, &empty).await) });
        for (action, status) in join_all(futures).await {
            if status != ActionStatus::Success {
                warn!(?action, ?status, phase, "best-effort action did not succeed");
            }
        }
    }
}
