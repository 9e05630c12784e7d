//! Top-level orchestrator settings.

use super::{ConfigError, FinancialSchema};
use crate::request::AgentKind;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const MAX_ATTEMPTS_CEILING: u32 = 10;

/// Per-call timeout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Fallback per-attempt agent timeout in milliseconds. When unset, the
    /// handler's declared maximum latency is used.
    #[serde(default)]
    pub default_agent_ms: Option<u64>,
    /// Per-kind per-attempt timeout overrides in milliseconds.
    #[serde(default)]
    pub per_kind: BTreeMap<AgentKind, u64>,
    /// Bound on a single audit store write in milliseconds.
    #[serde(default = "default_audit_write_ms")]
    pub audit_write_ms: u64,
}

const fn default_audit_write_ms() -> u64 {
    2_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_agent_ms: None,
            per_kind: BTreeMap::new(),
            audit_write_ms: default_audit_write_ms(),
        }
    }
}

/// Intent classifier thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Rule confidence below which the model fallback is consulted.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// "Needs current information" confidence above which chat searches
    /// the web.
    #[serde(default = "default_web_search_threshold")]
    pub web_search_threshold: f64,
    /// Bound on a single model fallback call in milliseconds.
    #[serde(default = "default_model_timeout_ms")]
    pub model_timeout_ms: u64,
}

const fn default_confidence_threshold() -> f64 {
    0.6
}

const fn default_web_search_threshold() -> f64 {
    0.5
}

const fn default_model_timeout_ms() -> u64 {
    3_000
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            web_search_threshold: default_web_search_threshold(),
            model_timeout_ms: default_model_timeout_ms(),
        }
    }
}

impl ClassifierConfig {
    /// Returns the model fallback call bound.
    #[must_use]
    pub const fn model_timeout(&self) -> Duration {
        Duration::from_millis(self.model_timeout_ms)
    }
}

/// Output validator thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Largest acceptable slide count for a generated deck.
    #[serde(default = "default_max_slides")]
    pub max_slides: u32,
    /// Schema the financial handler extracts against.
    #[serde(default)]
    pub financial_schema: FinancialSchema,
    /// Bound on a single artifact lookup in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

const fn default_max_slides() -> u32 {
    60
}

const fn default_lookup_timeout_ms() -> u64 {
    5_000
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_slides: default_max_slides(),
            financial_schema: FinancialSchema::default(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl ValidatorConfig {
    /// Returns the artifact lookup bound.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Audit trail settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Days an audit entry is retained before it may be purged.
    #[serde(default = "default_audit_retention_days")]
    pub retention_days: u32,
    /// Interval between background reconciliation passes in milliseconds.
    #[serde(default = "default_reconcile_interval_ms")]
    pub reconcile_interval_ms: u64,
}

const fn default_audit_retention_days() -> u32 {
    730
}

const fn default_reconcile_interval_ms() -> u64 {
    5_000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            retention_days: default_audit_retention_days(),
            reconcile_interval_ms: default_reconcile_interval_ms(),
        }
    }
}

impl AuditConfig {
    /// Returns the reconciliation interval.
    #[must_use]
    pub const fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms)
    }

    /// Returns how long an entry is retained.
    #[must_use]
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

/// Pattern analyzer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    /// Width of the audit window each analysis reads, in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    /// Days a pattern record is retained.
    #[serde(default = "default_pattern_retention_days")]
    pub retention_days: u32,
    /// Interval between scheduled analysis runs in milliseconds.
    #[serde(default = "default_pattern_interval_ms")]
    pub interval_ms: u64,
    /// Rejection rate above which a kind is flagged in recommendations.
    #[serde(default = "default_rejection_alert_threshold")]
    pub rejection_alert_threshold: f64,
}

const fn default_window_hours() -> u32 {
    24 * 30
}

const fn default_pattern_retention_days() -> u32 {
    365
}

const fn default_pattern_interval_ms() -> u64 {
    60 * 60 * 1_000
}

const fn default_rejection_alert_threshold() -> f64 {
    0.3
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            retention_days: default_pattern_retention_days(),
            interval_ms: default_pattern_interval_ms(),
            rejection_alert_threshold: default_rejection_alert_threshold(),
        }
    }
}

impl PatternConfig {
    /// Returns the interval between scheduled runs.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Returns the width of the analysis window.
    #[must_use]
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.window_hours))
    }

    /// Returns how long a pattern record is retained.
    #[must_use]
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

/// Immutable orchestrator configuration.
///
/// # Examples
///
/// ```
/// use scriptorium::config::OrchestratorConfig;
///
/// let config = OrchestratorConfig::from_toml_str("max_attempts = 2").expect("valid config");
/// assert_eq!(config.max_attempts(), 2);
/// assert_eq!(config.validator().max_slides, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    #[serde(default = "default_supported_kinds")]
    supported_kinds: Vec<AgentKind>,
    #[serde(default)]
    timeouts: TimeoutConfig,
    #[serde(default)]
    classifier: ClassifierConfig,
    #[serde(default)]
    validator: ValidatorConfig,
    #[serde(default)]
    audit: AuditConfig,
    #[serde(default)]
    patterns: PatternConfig,
}

const fn default_max_attempts() -> u32 {
    3
}

fn default_supported_kinds() -> Vec<AgentKind> {
    AgentKind::ALL.to_vec()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            supported_kinds: default_supported_kinds(),
            timeouts: TimeoutConfig::default(),
            classifier: ClassifierConfig::default(),
            validator: ValidatorConfig::default(),
            audit: AuditConfig::default(),
            patterns: PatternConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates configuration from `file_name` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(dir: &Dir, file_name: &str) -> Result<Self, ConfigError> {
        let text = dir.read_to_string(file_name)?;
        Self::from_toml_str(&text)
    }

    /// Checks every range constraint.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_CEILING {
            return Err(ConfigError::invalid(
                "max_attempts",
                format!("expected 1..={MAX_ATTEMPTS_CEILING}, got {}", self.max_attempts),
            ));
        }
        if self.supported_kinds.is_empty() {
            return Err(ConfigError::invalid(
                "supported_kinds",
                "at least one agent kind must be supported",
            ));
        }
        if self.timeouts.audit_write_ms == 0 {
            return Err(ConfigError::invalid("timeouts.audit_write_ms", "must be non-zero"));
        }
        if self.classifier.model_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "classifier.model_timeout_ms",
                "must be non-zero",
            ));
        }
        if self.validator.lookup_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "validator.lookup_timeout_ms",
                "must be non-zero",
            ));
        }
        if self.timeouts.default_agent_ms == Some(0)
            || self.timeouts.per_kind.values().any(|ms| *ms == 0)
        {
            return Err(ConfigError::invalid("timeouts", "agent timeouts must be non-zero"));
        }
        check_unit_interval(
            "classifier.confidence_threshold",
            self.classifier.confidence_threshold,
        )?;
        check_unit_interval(
            "classifier.web_search_threshold",
            self.classifier.web_search_threshold,
        )?;
        check_unit_interval(
            "patterns.rejection_alert_threshold",
            self.patterns.rejection_alert_threshold,
        )?;
        if self.validator.max_slides == 0 {
            return Err(ConfigError::invalid("validator.max_slides", "must be non-zero"));
        }
        if self.validator.financial_schema.fields.is_empty() {
            return Err(ConfigError::invalid(
                "validator.financial_schema",
                "schema must declare at least one field",
            ));
        }
        if self.patterns.window_hours == 0 {
            return Err(ConfigError::invalid("patterns.window_hours", "must be non-zero"));
        }
        if self.patterns.interval_ms == 0 {
            return Err(ConfigError::invalid("patterns.interval_ms", "must be non-zero"));
        }
        if self.audit.reconcile_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "audit.reconcile_interval_ms",
                "must be non-zero",
            ));
        }
        Ok(())
    }

    /// Returns the bound on agent attempts per request.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the agent kinds this deployment serves.
    #[must_use]
    pub fn supported_kinds(&self) -> &[AgentKind] {
        &self.supported_kinds
    }

    /// Returns whether `kind` is served by this deployment.
    #[must_use]
    pub fn supports(&self, kind: AgentKind) -> bool {
        self.supported_kinds.contains(&kind)
    }

    /// Returns timeout settings.
    #[must_use]
    pub const fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Returns classifier thresholds.
    #[must_use]
    pub const fn classifier(&self) -> &ClassifierConfig {
        &self.classifier
    }

    /// Returns validator thresholds.
    #[must_use]
    pub const fn validator(&self) -> &ValidatorConfig {
        &self.validator
    }

    /// Returns audit settings.
    #[must_use]
    pub const fn audit(&self) -> &AuditConfig {
        &self.audit
    }

    /// Returns pattern analyzer settings.
    #[must_use]
    pub const fn patterns(&self) -> &PatternConfig {
        &self.patterns
    }

    /// Resolves the per-attempt timeout for an agent kind.
    ///
    /// Precedence: per-kind override, deployment default, then the
    /// handler's `declared` maximum latency.
    #[must_use]
    pub fn agent_timeout(&self, kind: AgentKind, declared: Duration) -> Duration {
        self.timeouts
            .per_kind
            .get(&kind)
            .copied()
            .or(self.timeouts.default_agent_ms)
            .map_or(declared, Duration::from_millis)
    }

    /// Returns the overall request deadline: the per-attempt timeout summed
    /// across `max_attempts` attempts.
    #[must_use]
    pub fn request_deadline(&self, kind: AgentKind, declared: Duration) -> Duration {
        self.agent_timeout(kind, declared)
            .saturating_mul(self.max_attempts)
    }

    /// Returns the audit write bound.
    #[must_use]
    pub const fn audit_write_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.audit_write_ms)
    }
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("expected 0.0..=1.0, got {value}")))
    }
}
