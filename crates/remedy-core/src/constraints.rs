//! Per-environment recovery constraints.
//!
//! Resolved once at plan-creation time and never mutated. Production is
//! stricter than staging, which is stricter than development.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::failure::Environment;

/// Policy limits applied when planning a recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConstraints {
    /// Maximum tolerated downtime. Zero restricts planning to strategies
    /// composed entirely of downtime-safe actions.
    pub max_downtime_minutes: u32,
    /// Minimum availability to maintain during recovery, in `[0, 1]`.
    pub min_availability: f64,
    /// Whether recovery requires an approval gate before mutating actions.
    pub requires_approval: bool,
    /// Whether serving degraded read-only traffic is acceptable.
    pub readonly_mode_acceptable: bool,
}

impl RecoveryConstraints {
    pub fn zero_downtime_required(&self) -> bool {
        self.max_downtime_minutes == 0
    }
}

/// Environment → constraints lookup table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintPolicy {
    environments: BTreeMap<Environment, RecoveryConstraints>,
}

impl Default for ConstraintPolicy {
    fn default() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(
            Environment::Production,
            RecoveryConstraints {
                max_downtime_minutes: 0,
                min_availability: 0.999,
                requires_approval: true,
                readonly_mode_acceptable: true,
            },
        );
        environments.insert(
            Environment::Staging,
            RecoveryConstraints {
                max_downtime_minutes: 15,
                min_availability: 0.95,
                requires_approval: false,
                readonly_mode_acceptable: true,
            },
        );
        environments.insert(
            Environment::Development,
            RecoveryConstraints {
                max_downtime_minutes: 120,
                min_availability: 0.0,
                requires_approval: false,
                readonly_mode_acceptable: true,
            },
        );
        Self { environments }
    }
}

impl ConstraintPolicy {
    pub fn new(environments: BTreeMap<Environment, RecoveryConstraints>) -> Self {
        Self { environments }
    }

    /// Constraints for an environment. Environments absent from the
    /// table fall back to the production defaults, the strictest policy.
    pub fn resolve(&self, environment: Environment) -> RecoveryConstraints {
        self.environments
            .get(&environment)
            .cloned()
            .unwrap_or_else(|| {
                ConstraintPolicy::default()
                    .environments
                    .remove(&Environment::Production)
                    .unwrap_or(RecoveryConstraints {
                        max_downtime_minutes: 0,
                        min_availability: 0.999,
                        requires_approval: true,
                        readonly_mode_acceptable: false,
                    })
            })
    }
}
