//! Domain errors for the audit framework.

use thiserror::Error;

/// Errors surfaced by rules, the orchestrator and the call memoizer.
///
/// Payloads are plain strings so the error is `Clone`: a single upstream
/// failure can be handed unchanged to every caller waiting on the same
/// memoized read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Duplicate rule registered: {0}")]
    DuplicateRule(String),

    #[error("Rule catalog mismatch: {0}")]
    CatalogMismatch(String),

    #[error("Rule '{rule}' requires fix parameter '{parameter}' which was not supplied")]
    MissingFixParameter { rule: String, parameter: String },

    #[error("Resource '{resource_id}' is not a known non-compliant resource of rule '{rule}'")]
    UnknownResource { rule: String, resource_id: String },

    #[error("Service call '{operation}' failed: {message}")]
    ClientCall { operation: String, message: String },

    #[error("Check failed for rule '{rule}': {message}")]
    CheckFailed { rule: String, message: String },

    #[error("Check for rule '{rule}' timed out after {timeout_secs}s")]
    CheckTimedOut { rule: String, timeout_secs: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type AuditResult<T> = Result<T, AuditError>;

impl AuditError {
    /// Convenience constructor for client failures.
    pub fn client_call(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientCall {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a caller contract violation rather than an
    /// operational failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::RuleNotFound(_) | Self::MissingFixParameter { .. } | Self::UnknownResource { .. }
        )
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AuditError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Catalog(err.to_string())
    }
}
