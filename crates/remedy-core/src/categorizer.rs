//! Failure categorization.
//!
//! Turns raw failure signals (error messages, log lines, metrics, status
//! codes) into a typed, severity-ranked [`CategorizedFailure`]. Pure:
//! no side effects, never errors — an unmatched signal falls back to
//! `Application` / `Low` with confidence 0.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RemedyError, Result};
use crate::failure::{CategorizedFailure, FailureContext, FailureKind, Severity};

/// Raw inputs for one categorization call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureSignals {
    pub error_messages: Vec<String>,
    pub log_lines: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
    pub status_codes: Vec<u16>,
}

impl FailureSignals {
    /// Concatenated text evidence evaluated against the pattern sets.
    fn evidence_text(&self) -> String {
        let mut text = String::new();
        for msg in self.error_messages.iter().chain(self.log_lines.iter()) {
            text.push_str(msg);
            text.push('\n');
        }
        text
    }
}

/// One regular-expression rule voting for a (kind, severity) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRuleSpec {
    pub pattern: String,
    pub kind: FailureKind,
    pub severity: Severity,
    #[serde(default = "default_pattern_weight")]
    pub weight: f64,
}

fn default_pattern_weight() -> f64 {
    2.0
}

/// A metric-threshold rule: fires when the named metric is at or above
/// the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRuleSpec {
    pub metric: String,
    pub threshold: f64,
    pub kind: FailureKind,
    pub severity: Severity,
    #[serde(default = "default_signal_weight")]
    pub weight: f64,
}

/// A status-code range rule (inclusive bounds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCodeRuleSpec {
    pub min: u16,
    pub max: u16,
    pub kind: FailureKind,
    pub severity: Severity,
    #[serde(default = "default_signal_weight")]
    pub weight: f64,
}

fn default_signal_weight() -> f64 {
    1.0
}

/// Operator-facing categorizer configuration, loaded once and compiled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizerSpec {
    /// Evidence matching these is suppressed unless a critical pattern
    /// also matches.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Evidence matching these is always Critical.
    #[serde(default)]
    pub critical: Vec<String>,
    /// Patterns describing conditions known to be automatically
    /// recoverable. These vote like ordinary rules and mark the evidence.
    #[serde(default)]
    pub auto_recovery: Vec<PatternRuleSpec>,
    #[serde(default)]
    pub rules: Vec<PatternRuleSpec>,
    #[serde(default)]
    pub metric_rules: Vec<MetricRuleSpec>,
    #[serde(default)]
    pub status_code_rules: Vec<StatusCodeRuleSpec>,
}

impl Default for CategorizerSpec {
    /// Built-in rule set covering the common deployment failure modes.
    /// Operators extend or replace it via the YAML config.
    fn default() -> Self {
        let rule = |pattern: &str, kind, severity| PatternRuleSpec {
            pattern: pattern.to_string(),
            kind,
            severity,
            weight: 2.0,
        };
        Self {
            ignore: vec![
                r"(?i)deprecat".to_string(),
                r"(?i)warning: .*retry".to_string(),
            ],
            critical: vec![
                r"(?i)data (loss|corruption)".to_string(),
                r"(?i)security breach".to_string(),
                r"(?i)total outage".to_string(),
            ],
            auto_recovery: vec![
                rule(r"(?i)connection.*timeout", FailureKind::Data, Severity::High),
                rule(
                    r"(?i)connection pool exhausted",
                    FailureKind::Data,
                    Severity::High,
                ),
                rule(
                    r"(?i)temporar(y|ily) unavailable",
                    FailureKind::Dependency,
                    Severity::Medium,
                ),
            ],
            rules: vec![
                rule(r"(?i)out of memory|oom.?kill", FailureKind::Resource, Severity::High),
                rule(r"(?i)disk (full|space)", FailureKind::Resource, Severity::High),
                rule(
                    r"(?i)dns|network unreachable|connection refused",
                    FailureKind::Network,
                    Severity::Medium,
                ),
                rule(
                    r"(?i)certificate|tls handshake",
                    FailureKind::Security,
                    Severity::High,
                ),
                rule(
                    r"(?i)missing environment variable|invalid config",
                    FailureKind::Configuration,
                    Severity::Medium,
                ),
                rule(
                    r"(?i)upstream.*(error|unavailable)|third.party",
                    FailureKind::Dependency,
                    Severity::Medium,
                ),
                rule(
                    r"(?i)deadlock|race condition|timed out waiting",
                    FailureKind::Timing,
                    Severity::Medium,
                ),
                rule(
                    r"(?i)panic|unhandled exception|null pointer",
                    FailureKind::Application,
                    Severity::Medium,
                ),
                rule(
                    r"(?i)manual(ly)? (rolled back|deployed)|wrong branch",
                    FailureKind::HumanError,
                    Severity::Low,
                ),
                rule(
                    r"(?i)node (down|unreachable)|kubelet",
                    FailureKind::Infrastructure,
                    Severity::High,
                ),
            ],
            metric_rules: vec![
                MetricRuleSpec {
                    metric: "error_rate".to_string(),
                    threshold: 10.0,
                    kind: FailureKind::Application,
                    severity: Severity::High,
                    weight: 1.0,
                },
                MetricRuleSpec {
                    metric: "latency_p99_ms".to_string(),
                    threshold: 2000.0,
                    kind: FailureKind::Timing,
                    severity: Severity::Medium,
                    weight: 1.0,
                },
                MetricRuleSpec {
                    metric: "memory_percent".to_string(),
                    threshold: 95.0,
                    kind: FailureKind::Resource,
                    severity: Severity::High,
                    weight: 1.0,
                },
            ],
            status_code_rules: vec![
                StatusCodeRuleSpec {
                    min: 500,
                    max: 599,
                    kind: FailureKind::Infrastructure,
                    severity: Severity::High,
                    weight: 1.0,
                },
                StatusCodeRuleSpec {
                    min: 429,
                    max: 429,
                    kind: FailureKind::Resource,
                    severity: Severity::Medium,
                    weight: 1.0,
                },
                StatusCodeRuleSpec {
                    min: 401,
                    max: 403,
                    kind: FailureKind::Security,
                    severity: Severity::High,
                    weight: 1.0,
                },
            ],
        }
    }
}

#[derive(Debug)]
struct CompiledRule {
    regex: Regex,
    label: String,
    kind: FailureKind,
    severity: Severity,
    weight: f64,
}

/// Compiled categorizer. Read-only after construction; shareable across
/// executions without locking.
#[derive(Debug)]
pub struct FailureCategorizer {
    ignore: Vec<Regex>,
    critical: Vec<Regex>,
    rules: Vec<CompiledRule>,
    metric_rules: Vec<MetricRuleSpec>,
    status_code_rules: Vec<StatusCodeRuleSpec>,
}

struct Vote {
    kind: FailureKind,
    severity: Severity,
    weight: f64,
    evidence: String,
}

impl FailureCategorizer {
    /// Compile a spec. Fails on any invalid regular expression — pattern
    /// errors are configuration errors, surfaced at load time.
    pub fn compile(spec: &CategorizerSpec) -> Result<Self> {
        let compile_set = |patterns: &[String]| -> Result<Vec<Regex>> {
            patterns.iter().map(|p| compile_pattern(p)).collect()
        };
        let compile_rules = |rules: &[PatternRuleSpec], group: &str| -> Result<Vec<CompiledRule>> {
            rules
                .iter()
                .map(|r| {
                    Ok(CompiledRule {
                        regex: compile_pattern(&r.pattern)?,
                        label: format!("{group}:{}", r.pattern),
                        kind: r.kind,
                        severity: r.severity,
                        weight: r.weight,
                    })
                })
                .collect()
        };

        let mut rules = compile_rules(&spec.auto_recovery, "auto_recovery")?;
        rules.extend(compile_rules(&spec.rules, "pattern")?);

        Ok(Self {
            ignore: compile_set(&spec.ignore)?,
            critical: compile_set(&spec.critical)?,
            rules,
            metric_rules: spec.metric_rules.clone(),
            status_code_rules: spec.status_code_rules.clone(),
        })
    }

    /// Classify one failure signal. Never errors; an unmatched signal
    /// yields `Application` / `Low` with confidence 0.
    pub fn categorize(&self, signals: &FailureSignals, context: FailureContext) -> CategorizedFailure {
        let text = signals.evidence_text();

        let ignore_matched = self.ignore.iter().any(|re| re.is_match(&text));
        let critical_matched = self.critical.iter().find(|re| re.is_match(&text));

        let mut votes: Vec<Vote> = Vec::new();

        for rule in &self.rules {
            if rule.regex.is_match(&text) {
                votes.push(Vote {
                    kind: rule.kind,
                    severity: rule.severity,
                    weight: rule.weight,
                    evidence: rule.label.clone(),
                });
            }
        }

        for rule in &self.metric_rules {
            if let Some(value) = signals.metrics.get(&rule.metric) {
                if *value >= rule.threshold {
                    votes.push(Vote {
                        kind: rule.kind,
                        severity: rule.severity,
                        weight: rule.weight,
                        evidence: format!("metric:{}={value}>={}", rule.metric, rule.threshold),
                    });
                }
            }
        }

        for rule in &self.status_code_rules {
            let hits: Vec<u16> = signals
                .status_codes
                .iter()
                .copied()
                .filter(|c| *c >= rule.min && *c <= rule.max)
                .collect();
            if !hits.is_empty() {
                votes.push(Vote {
                    kind: rule.kind,
                    severity: rule.severity,
                    weight: rule.weight,
                    evidence: format!("status:{hits:?}"),
                });
            }
        }

        self.resolve(votes, ignore_matched, critical_matched.is_some(), context)
    }

    fn resolve(
        &self,
        votes: Vec<Vote>,
        ignore_matched: bool,
        critical_matched: bool,
        context: FailureContext,
    ) -> CategorizedFailure {
        if votes.is_empty() && !critical_matched {
            // No rule matched. Low-confidence default, never an error.
            return CategorizedFailure {
                kind: FailureKind::Application,
                severity: if ignore_matched { Severity::Info } else { Severity::Low },
                confidence: 0.0,
                evidence: Vec::new(),
                context,
            };
        }

        // Tally evidence per kind: match count first, total weight as the
        // tie-breaker.
        let mut tally: BTreeMap<&'static str, (FailureKind, usize, f64)> = BTreeMap::new();
        for vote in &votes {
            let entry = tally
                .entry(vote.kind.as_str())
                .or_insert((vote.kind, 0, 0.0));
            entry.1 += 1;
            entry.2 += vote.weight;
        }

        let total_weight: f64 = votes.iter().map(|v| v.weight).sum();
        let (kind, _count, kind_weight) = tally
            .values()
            .max_by(|a, b| {
                a.1.cmp(&b.1)
                    .then(a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
            })
            .copied()
            .unwrap_or((FailureKind::Application, 0, 0.0));

        let voted_severity = votes
            .iter()
            .filter(|v| v.kind == kind)
            .map(|v| v.severity)
            .max()
            .unwrap_or(Severity::Low);

        let mut evidence: Vec<String> = votes.into_iter().map(|v| v.evidence).collect();

        // Critical always wins ties; ignore suppresses everything short of
        // a critical match.
        let severity = if critical_matched {
            evidence.push("critical_pattern".to_string());
            Severity::Critical
        } else if ignore_matched {
            evidence.push("ignore_pattern".to_string());
            Severity::Info
        } else {
            voted_severity
        };

        let confidence = if total_weight > 0.0 {
            (kind_weight / total_weight).clamp(0.0, 1.0)
        } else if critical_matched {
            1.0
        } else {
            0.0
        };

        debug!(
            kind = kind.as_str(),
            severity = ?severity,
            confidence,
            evidence_count = evidence.len(),
            "categorized failure signal"
        );

        CategorizedFailure {
            kind,
            severity,
            confidence,
            evidence,
            context,
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| RemedyError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
