//! Top-level configuration document.
//!
//! One YAML file defines the categorizer pattern sets, per-environment
//! constraints, the full strategy library, engine/orchestrator tuning,
//! and per-platform webhook settings. Loaded once and validated eagerly:
//! invalid patterns, dangling node ids, duplicate strategy ids, and
//! unknown action/check kinds are all load-time errors, never execution-
//! time surprises.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::categorizer::{CategorizerSpec, FailureCategorizer};
use crate::constraints::ConstraintPolicy;
use crate::engine::EngineConfig;
use crate::error::{RemedyError, Result};
use crate::failure::Environment;
use crate::orchestrator::OrchestratorSettings;
use crate::strategy::StrategyLibrary;

/// How a platform authenticates its webhook calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthScheme {
    /// HMAC-SHA256 over the raw payload, hex-encoded in the named
    /// header (optionally prefixed, e.g. `sha256=`).
    Signature {
        secret: String,
        header: String,
        #[serde(default)]
        prefix: String,
    },
    /// Shared token carried verbatim in the named header.
    Token { secret: String, header: String },
}

/// Webhook settings for one CI/CD platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform identifier, e.g. `github` or `gitlab`.
    pub name: String,
    /// HTTP path serving this platform's webhook, e.g. `/webhook/github`.
    pub path: String,
    pub auth: AuthScheme,
    /// Environments eligible for automatic recovery. Failures in other
    /// environments receive recommendations only.
    #[serde(default)]
    pub allowed_environments: Vec<Environment>,
}

/// The complete Remedy configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemedyConfig {
    #[serde(default)]
    pub categorizer: CategorizerSpec,
    #[serde(default)]
    pub constraints: ConstraintPolicy,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub library: StrategyLibrary,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
}

impl RemedyConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(document: &str) -> Result<Self> {
        let config: RemedyConfig = serde_yaml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let document = std::fs::read_to_string(path)?;
        Self::from_yaml(&document)
    }

    /// Eager validation of everything serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.library.validate()?;
        // Compile-check the pattern sets so bad regexes fail here.
        FailureCategorizer::compile(&self.categorizer)?;

        let mut names = std::collections::BTreeSet::new();
        let mut paths = std::collections::BTreeSet::new();
        for platform in &self.platforms {
            if !names.insert(&platform.name) {
                return Err(RemedyError::Config(format!(
                    "duplicate platform name: {}",
                    platform.name
                )));
            }
            if !paths.insert(&platform.path) {
                return Err(RemedyError::Config(format!(
                    "duplicate webhook path: {}",
                    platform.path
                )));
            }
            if !platform.path.starts_with('/') {
                return Err(RemedyError::Config(format!(
                    "webhook path must start with '/': {}",
                    platform.path
                )));
            }
            let secret = match &platform.auth {
                AuthScheme::Signature { secret, .. } => secret,
                AuthScheme::Token { secret, .. } => secret,
            };
            if secret.is_empty() {
                return Err(RemedyError::Config(format!(
                    "platform {} has an empty webhook secret",
                    platform.name
                )));
            }
        }
        Ok(())
    }

    /// Compile the categorizer from the loaded pattern sets.
    pub fn categorizer(&self) -> Result<FailureCategorizer> {
        FailureCategorizer::compile(&self.categorizer)
    }
}
