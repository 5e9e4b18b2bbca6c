//! Remedy Core Library
//!
//! Deployment-failure recovery engine: failure categorization,
//! decision-tree strategy execution, and multi-phase recovery
//! orchestration. Webhook ingestion lives in `remedy-webhook`; this
//! crate is transport-agnostic and talks to infrastructure only through
//! the injected collaborator contracts.

pub mod categorizer;
pub mod collaborators;
pub mod config;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod execution;
pub mod failure;
pub mod metrics;
pub mod orchestrator;
pub mod strategy;
pub mod telemetry;

pub use categorizer::{
    CategorizerSpec, FailureCategorizer, FailureSignals, MetricRuleSpec, PatternRuleSpec,
    StatusCodeRuleSpec,
};
pub use collaborators::{
    ActionExecutor, ActionStatus, ApprovalDecision, ApprovalGate, HealthCheck, NotificationSink,
};
pub use config::{AuthScheme, PlatformConfig, RemedyConfig};
pub use constraints::{ConstraintPolicy, RecoveryConstraints};
pub use engine::{DecisionTreeEngine, EngineConfig};
pub use error::{RemedyError, Result};
pub use execution::{
    read_execution_artifact, write_execution_artifact, DecisionPath, PathStep, Phase, PhaseRecord,
    PhaseStatus, RecoveryExecution, RecoveryMetrics, StepOutcome, TraversalOutcome,
};
pub use failure::{
    CategorizedFailure, Environment, FailureContext, FailureKind, FailureSignature, Severity,
};
pub use metrics::METRICS;
pub use orchestrator::{
    OrchestratorSettings, RecoveryDisposition, RecoveryOrchestrator, RecoveryPlan,
    ValidationSettings,
};
pub use strategy::{
    ActionKind, Applicability, CheckKind, DecisionNode, NodeId, RecoveryStrategy, RetryPolicy,
    StrategyLibrary,
};
pub use telemetry::init_tracing;

/// Remedy version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
