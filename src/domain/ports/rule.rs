//! Rule port.

use async_trait::async_trait;

use crate::domain::errors::AuditResult;
use crate::domain::models::{FixOutcome, FixParameterValue, RuleMetadata, RuleStats};

/// The unit-of-work contract implemented once per audited condition.
///
/// Implementations own their statistics and their memoized service
/// clients. Most implementations embed a
/// [`RuleState`](crate::services::rule_support::RuleState) and delegate the
/// stats operations to it.
#[async_trait]
pub trait Rule: Send + Sync {
    /// Static metadata supplied at construction.
    fn metadata(&self) -> &RuleMetadata;

    /// Snapshot of the current statistics.
    async fn stats(&self) -> RuleStats;

    /// Reset statistics to empty lists, `Loaded` and an empty error log.
    async fn clear_stats(&self);

    /// Discover and classify resources, writing the result into the stats.
    ///
    /// Well-behaved rules capture their own failures (status `Error` plus a
    /// timestamped entry) and return `Ok`. The orchestrator still isolates
    /// an `Err`, a panic or a timeout to this rule.
    async fn check(&self) -> AuditResult<()>;

    /// Remediate the given non-compliant resources.
    ///
    /// Returns `Err` only for caller contract violations such as a missing
    /// required parameter, before any remediation call is made. Failures on
    /// individual resources are reported in the [`FixOutcome`] and the
    /// stats error log.
    async fn fix(
        &self,
        non_compliant_resources: &[String],
        parameters: &[FixParameterValue],
    ) -> AuditResult<FixOutcome>;

    /// Registry key of this rule.
    fn name(&self) -> &str {
        &self.metadata().name
    }
}
