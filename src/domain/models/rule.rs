//! Rule domain models.
//!
//! A rule carries immutable [`RuleMetadata`] describing what it audits and
//! how its fix behaves, plus mutable [`RuleStats`] describing the outcome of
//! its most recent check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// Never checked, or stats were explicitly cleared
    #[default]
    Loaded,
    /// Check in progress
    Checking,
    /// Check completed
    Finished,
    /// Check or fix raised and the failure was captured
    Error,
}

impl RuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Checking => "checking",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "loaded" => Some(Self::Loaded),
            "checking" => Some(Self::Checking),
            "finished" => Some(Self::Finished),
            "error" | "errored" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether a check has settled in this status.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter a rule needs before it can apply its fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixParameter {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub example: String,
}

impl FixParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default: String::new(),
            example: String::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }
}

/// A caller-supplied value for a [`FixParameter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixParameterValue {
    pub name: String,
    pub value: String,
}

impl FixParameterValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An external operation a rule invokes, with the reason it needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCall {
    pub name: String,
    pub reason: String,
}

impl ApiCall {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Static description of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    /// Unique display name, used as the registry key
    pub name: String,
    pub description: String,
    pub priority: u32,
    pub priority_reason: String,
    pub service: String,
    pub category: String,
    pub best_practice: String,
    #[serde(default)]
    pub required_parameters_for_fix: Vec<FixParameter>,
    /// Fix performs an irreversible or destructive action
    #[serde(default)]
    pub is_fix_dangerous: bool,
    #[serde(default)]
    pub check_calls: Vec<ApiCall>,
    #[serde(default)]
    pub fix_calls: Vec<ApiCall>,
    #[serde(default)]
    pub advice_before_fix: String,
}

impl RuleMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            priority: 0,
            priority_reason: String::new(),
            service: String::new(),
            category: String::new(),
            best_practice: String::new(),
            required_parameters_for_fix: Vec::new(),
            is_fix_dangerous: false,
            check_calls: Vec::new(),
            fix_calls: Vec::new(),
            advice_before_fix: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: u32, reason: impl Into<String>) -> Self {
        self.priority = priority;
        self.priority_reason = reason.into();
        self
    }

    pub fn with_taxonomy(
        mut self,
        service: impl Into<String>,
        category: impl Into<String>,
        best_practice: impl Into<String>,
    ) -> Self {
        self.service = service.into();
        self.category = category.into();
        self.best_practice = best_practice.into();
        self
    }

    pub fn with_fix_parameter(mut self, parameter: FixParameter) -> Self {
        self.required_parameters_for_fix.push(parameter);
        self
    }

    pub fn with_dangerous_fix(mut self, dangerous: bool) -> Self {
        self.is_fix_dangerous = dangerous;
        self
    }

    pub fn with_check_call(mut self, call: ApiCall) -> Self {
        self.check_calls.push(call);
        self
    }

    pub fn with_fix_call(mut self, call: ApiCall) -> Self {
        self.fix_calls.push(call);
        self
    }

    pub fn with_advice(mut self, advice: impl Into<String>) -> Self {
        self.advice_before_fix = advice.into();
        self
    }
}

/// A timestamped error captured while checking or fixing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl RuleErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Mutable outcome of a rule's checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStats {
    pub compliant_resources: Vec<String>,
    pub non_compliant_resources: Vec<String>,
    pub status: RuleStatus,
    /// Accumulated across the rule's lifetime until an explicit reset
    pub errors: Vec<RuleErrorEntry>,
}

impl RuleStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Classification produced by a rule's discovery logic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub compliant: Vec<String>,
    pub non_compliant: Vec<String>,
}

impl Classification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compliant(&mut self, resource_id: impl Into<String>) {
        self.compliant.push(resource_id.into());
    }

    pub fn non_compliant(&mut self, resource_id: impl Into<String>) {
        self.non_compliant.push(resource_id.into());
    }

    /// Classify a resource by a predicate result.
    pub fn classify(&mut self, resource_id: impl Into<String>, is_compliant: bool) {
        if is_compliant {
            self.compliant(resource_id);
        } else {
            self.non_compliant(resource_id);
        }
    }
}

/// A remediation failure for a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFailure {
    pub resource_id: String,
    pub message: String,
}

/// Per-resource result of a fix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOutcome {
    pub attempted: usize,
    pub remediated: Vec<String>,
    pub failed: Vec<ResourceFailure>,
}

impl FixOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
