//! Declarative rule catalog port.

use crate::domain::errors::AuditResult;
use crate::domain::models::RuleCatalogEntry;

/// Supplies declarative metadata records merged into the rule registry.
pub trait CatalogSource: Send + Sync {
    fn load_entries(&self) -> AuditResult<Vec<RuleCatalogEntry>>;
}
