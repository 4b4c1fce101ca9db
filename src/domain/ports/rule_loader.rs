//! Rule loader port.

use std::sync::Arc;

use crate::domain::errors::AuditResult;
use crate::domain::ports::Rule;

/// Supplies instantiated rules at orchestrator construction.
///
/// The returned order is the registration order used for listing.
pub trait RuleLoader: Send + Sync {
    fn load_rules(&self) -> AuditResult<Vec<Arc<dyn Rule>>>;
}
