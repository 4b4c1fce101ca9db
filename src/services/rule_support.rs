//! Building blocks for rule implementations.
//!
//! [`RuleState`] owns a rule's statistics and drives the check state
//! machine (`Loaded -> Checking -> Finished | Error`) around the
//! rule-specific discovery future, so individual rules only classify
//! resources and remediate them.

use std::future::Future;

use tokio::sync::RwLock;

use crate::domain::errors::{AuditError, AuditResult};
use crate::domain::models::{
    Classification, FixOutcome, FixParameterValue, ResourceFailure, RuleErrorEntry, RuleMetadata,
    RuleStats, RuleStatus,
};
use crate::infrastructure::logging::scrub_secrets;

/// Statistics cell embedded by rule implementations.
#[derive(Debug)]
pub struct RuleState {
    rule_name: String,
    stats: RwLock<RuleStats>,
}

impl RuleState {
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            stats: RwLock::new(RuleStats::new()),
        }
    }

    pub async fn snapshot(&self) -> RuleStats {
        self.stats.read().await.clone()
    }

    pub async fn status(&self) -> RuleStatus {
        self.stats.read().await.status
    }

    /// Reset to empty lists, `Loaded` and an empty error log.
    pub async fn clear(&self) {
        *self.stats.write().await = RuleStats::new();
    }

    /// Append a timestamped error and move to `Error`.
    pub async fn record_error(&self, message: impl AsRef<str>) {
        let message = scrub_secrets(message.as_ref());
        tracing::warn!(rule = %self.rule_name, error = %message, "rule error recorded");
        let mut stats = self.stats.write().await;
        stats.status = RuleStatus::Error;
        stats.errors.push(RuleErrorEntry::new(message));
    }

    /// Run a discovery future through the check state machine.
    ///
    /// The status is `Checking` while `discover` is pending. A successful
    /// classification replaces both resource lists and sets `Finished`; a
    /// failure is captured as an error entry with status `Error`, leaving
    /// the previous lists in place. Never returns `Err`.
    pub async fn run_check<Fut>(&self, discover: Fut) -> AuditResult<()>
    where
        Fut: Future<Output = AuditResult<Classification>>,
    {
        self.stats.write().await.status = RuleStatus::Checking;

        match discover.await {
            Ok(classification) => {
                let mut stats = self.stats.write().await;
                stats.compliant_resources = classification.compliant;
                stats.non_compliant_resources = classification.non_compliant;
                stats.status = RuleStatus::Finished;
                tracing::debug!(
                    rule = %self.rule_name,
                    compliant = stats.compliant_resources.len(),
                    non_compliant = stats.non_compliant_resources.len(),
                    "check classified resources"
                );
            }
            Err(err) => self.record_error(format!("check failed: {err}")).await,
        }
        Ok(())
    }

    /// Apply `remediate` to each resource in order.
    ///
    /// A failing resource does not stop the loop; each failure is recorded
    /// in the error log and the outcome.
    pub async fn run_fix<F, Fut>(&self, resource_ids: &[String], mut remediate: F) -> FixOutcome
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = AuditResult<()>>,
    {
        let mut outcome = FixOutcome {
            attempted: resource_ids.len(),
            ..Default::default()
        };

        for resource_id in resource_ids {
            match remediate(resource_id.clone()).await {
                Ok(()) => outcome.remediated.push(resource_id.clone()),
                Err(err) => {
                    let message = scrub_secrets(&err.to_string());
                    self.record_error(format!("fix failed for {resource_id}: {message}"))
                        .await;
                    outcome.failed.push(ResourceFailure {
                        resource_id: resource_id.clone(),
                        message,
                    });
                }
            }
        }

        tracing::info!(
            rule = %self.rule_name,
            attempted = outcome.attempted,
            remediated = outcome.remediated.len(),
            failed = outcome.failed.len(),
            "fix applied"
        );
        outcome
    }
}

/// Ensure every parameter the rule declares for its fix was supplied.
pub fn validate_fix_parameters(
    metadata: &RuleMetadata,
    parameters: &[FixParameterValue],
) -> AuditResult<()> {
    for required in &metadata.required_parameters_for_fix {
        if !parameters.iter().any(|p| p.name == required.name) {
            return Err(AuditError::MissingFixParameter {
                rule: metadata.name.clone(),
                parameter: required.name.clone(),
            });
        }
    }
    Ok(())
}

/// Look up a supplied parameter value by name.
pub fn parameter_value<'a>(parameters: &'a [FixParameterValue], name: &str) -> Option<&'a str> {
    parameters
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.value.as_str())
}
