//! Execution records: decision paths, recovery metrics, and the
//! append-only [`RecoveryExecution`] artifact.
//!
//! Artifacts are persisted as `<dir>/<signature>-<id>/execution.json`
//! with a SHA-256 digest sidecar so external reporting tools can verify
//! integrity.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{RemedyError, Result};
use crate::failure::CategorizedFailure;
use crate::strategy::NodeId;

/// Outcome recorded for a single visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Failure,
    Timeout,
}

/// One (node, outcome, timestamp) entry in a traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub node: NodeId,
    pub outcome: StepOutcome,
    pub at: DateTime<Utc>,
}

/// Final outcome of one strategy traversal.
///
/// `Timeout` means the per-execution visit budget was exhausted — the
/// signature of a cyclic strategy configuration, distinct from an
/// ordinary `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOutcome {
    Success,
    Failure,
    Timeout,
}

/// Audit record produced by one execution of a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPath {
    pub strategy_id: String,
    pub steps: Vec<PathStep>,
    pub outcome: TraversalOutcome,
    /// Set when a gate timed out or approval was denied.
    pub manual_intervention_required: bool,
}

impl DecisionPath {
    pub fn succeeded(&self) -> bool {
        self.outcome == TraversalOutcome::Success
    }
}

/// Accumulated metrics for one recovery execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryMetrics {
    pub duration_ms: u64,
    pub downtime_ms: u64,
    pub users_affected: u64,
    pub components_recovered: u32,
    pub fallbacks_used: u32,
    pub manual_interventions: u32,
    pub peak_cpu_percent: f64,
    pub peak_memory_mb: f64,
    pub estimated_cost_usd: f64,
}

/// The seven ordered recovery phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preparation,
    ImmediateResponse,
    Stabilization,
    Validation,
    Optimization,
    Cleanup,
    PostRecovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Per-phase status entry. Phases within one execution are strictly
/// ordered; no phase begins before the previous outcome is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub completed_at: DateTime<Utc>,
}

/// Append-only record of one recovery run, persisted at the end of
/// Post-Recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryExecution {
    pub id: Uuid,
    pub signature: String,
    pub failure: CategorizedFailure,
    pub success: bool,
    pub phases: Vec<PhaseRecord>,
    pub paths: Vec<DecisionPath>,
    pub metrics: RecoveryMetrics,
    /// Additional signals coalesced onto this execution while it was in
    /// flight.
    pub coalesced_signals: u32,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RecoveryExecution {
    fn artifact_dir_name(&self) -> String {
        format!("{}-{}", &self.signature[..12.min(self.signature.len())], self.id)
    }
}

fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Persist `<dir>/<signature>-<id>/execution.json` and its digest sidecar.
pub fn write_execution_artifact(execution: &RecoveryExecution, dir: &Path) -> Result<PathBuf> {
    let run_dir = dir.join(execution.artifact_dir_name());
    std::fs::create_dir_all(&run_dir)?;

    let artifact_path = run_dir.join("execution.json");
    let digest_path = run_dir.join("execution.digest");
    let json = serde_json::to_vec_pretty(execution)?;
    let digest = content_digest(&json);

    std::fs::write(&artifact_path, &json)?;
    std::fs::write(&digest_path, digest.as_bytes())?;

    Ok(artifact_path)
}

/// Read and verify an execution artifact written by
/// [`write_execution_artifact`].
pub fn read_execution_artifact(dir_name: &str, dir: &Path) -> Result<RecoveryExecution> {
    let run_dir = dir.join(dir_name);
    let json = std::fs::read(run_dir.join("execution.json"))?;
    let digest = std::fs::read_to_string(run_dir.join("execution.digest"))?;

    let actual = content_digest(&json);
    if digest.trim() != actual {
        return Err(RemedyError::DigestMismatch {
            expected: digest.trim().to_string(),
            actual,
        });
    }

    Ok(serde_json::from_slice(&json)?)
}
