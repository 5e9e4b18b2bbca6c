//! Remedy Daemon
//!
//! Loads one YAML configuration document, wires the recovery engine and
//! orchestrator, and serves the per-platform webhook routes over HTTP.
//!
//! ## Commands
//!
//! - `serve`: run the webhook server
//! - `check`: validate a configuration document and exit
//!
//! The daemon ships with dry-run collaborators: actions and approvals
//! are logged, never performed. Operators embed `remedy-core` with
//! their own `ActionExecutor`/`HealthCheck`/`ApprovalGate`
//! implementations for live remediation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use remedy_core::collaborators::fakes::{LogSink, StaticHealth};
use remedy_core::{
    ActionExecutor, ActionKind, ActionStatus, ApprovalDecision, ApprovalGate, CategorizedFailure,
    DecisionTreeEngine, HealthCheck, RecoveryOrchestrator, RemedyConfig, METRICS,
};
use remedy_webhook::CICDIntegrationManager;

#[derive(Parser)]
#[command(name = "remedyd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deployment-failure recovery daemon", long_about = None)]
struct Cli {
    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the configured webhook routes
    Serve {
        /// Path to the configuration document
        #[arg(short, long, env = "REMEDY_CONFIG")]
        config: PathBuf,

        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        listen: String,
    },

    /// Validate a configuration document and exit
    Check {
        /// Path to the configuration document
        #[arg(short, long, env = "REMEDY_CONFIG")]
        config: PathBuf,
    },
}

/// Logs every action instead of performing it and reports success, so
/// strategies can be exercised end to end without touching
/// infrastructure.
struct DryRunExecutor;

#[async_trait]
impl ActionExecutor for DryRunExecutor {
    async fn execute(
        &self,
        action: ActionKind,
        params: &BTreeMap<String, serde_json::Value>,
    ) -> ActionStatus {
        info!(action = ?action, params = ?params, "dry-run action");
        ActionStatus::Success
    }
}

/// Approves every gate after logging it. Safe only because the
/// executor is dry-run.
struct DryRunGate;

#[async_trait]
impl ApprovalGate for DryRunGate {
    async fn request(&self, gate_id: &str, failure: &CategorizedFailure) -> ApprovalDecision {
        warn!(
            gate = gate_id,
            kind = failure.kind.as_str(),
            "dry-run gate auto-approved"
        );
        ApprovalDecision::Approved
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    remedy_core::init_tracing(cli.json, cli.log_level);

    match cli.command {
        Commands::Serve { config, listen } => serve(&config, &listen).await,
        Commands::Check { config } => check(&config),
    }
}

async fn serve(config_path: &PathBuf, listen: &str) -> Result<()> {
    let config = RemedyConfig::load(config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    info!(
        strategies = config.library.strategies.len(),
        platforms = config.platforms.len(),
        "configuration loaded"
    );

    let actions: Arc<dyn ActionExecutor> = Arc::new(DryRunExecutor);
    let health: Arc<dyn HealthCheck> = Arc::new(StaticHealth::healthy());

    let engine = DecisionTreeEngine::new(
        Arc::new(config.library.clone()),
        actions.clone(),
        health.clone(),
        Arc::new(DryRunGate),
        config.engine.clone(),
    );
    let orchestrator = Arc::new(RecoveryOrchestrator::new(
        engine,
        config.constraints.clone(),
        actions,
        health,
        Arc::new(LogSink),
        config.orchestrator.clone(),
    ));
    let manager = Arc::new(CICDIntegrationManager::new(
        &config.platforms,
        config.categorizer()?,
        orchestrator,
    ));

    let app = remedy_webhook::router(manager);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!(listen, "remedyd serving webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server failed")?;

    METRICS.flush();
    Ok(())
}

fn check(config_path: &PathBuf) -> Result<()> {
    let config = RemedyConfig::load(config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    println!(
        "ok: {} strategies, {} platforms, visit budget {}",
        config.library.strategies.len(),
        config.platforms.len(),
        config.engine.visit_budget
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install ctrl-c handler");
    }
    info!("shutdown signal received");
}
