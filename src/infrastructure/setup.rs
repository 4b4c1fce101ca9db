//! Start-up wiring
//!
//! Builds the shared memo registry and the catalog source from
//! configuration, and constructs the orchestrator once so callers can pass
//! it explicitly to whatever consumes it.

use std::sync::Arc;

use crate::adapters::catalog::{StaticCatalog, YamlCatalog};
use crate::adapters::memo::MemoRegistry;
use crate::domain::errors::AuditResult;
use crate::domain::models::Config;
use crate::domain::ports::{CatalogSource, RuleLoader};
use crate::services::rule_orchestrator::RuleOrchestrator;
use crate::services::rule_registry::{RuleContext, RuleRegistry};

/// Process-wide collaborators derived from configuration.
#[derive(Debug, Clone)]
pub struct AuditRuntime {
    config: Config,
    memo: Arc<MemoRegistry>,
}

impl AuditRuntime {
    pub fn new(config: Config) -> Self {
        let memo = Arc::new(MemoRegistry::new(config.memo.clone()));
        Self { config, memo }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn memo(&self) -> &Arc<MemoRegistry> {
        &self.memo
    }

    /// Context handed to rule factories.
    pub fn rule_context(&self) -> RuleContext {
        RuleContext::new(Arc::clone(&self.memo))
    }

    /// Empty rule registry bound to this runtime's context.
    pub fn rule_registry(&self) -> RuleRegistry {
        RuleRegistry::new(self.rule_context())
    }

    /// Catalog source named by `catalog_path`, or an empty catalog.
    pub fn catalog(&self) -> Box<dyn CatalogSource> {
        match self.config.catalog_path {
            Some(ref path) => Box::new(YamlCatalog::new(path)),
            None => Box::new(StaticCatalog::empty()),
        }
    }

    /// Build the orchestrator from a loader and the configured catalog.
    pub fn build_orchestrator(&self, loader: &dyn RuleLoader) -> AuditResult<RuleOrchestrator> {
        let catalog = self.catalog();
        RuleOrchestrator::new(
            loader,
            catalog.as_ref(),
            Arc::clone(&self.memo),
            self.config.orchestrator.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_without_catalog_path_uses_empty_catalog() {
        let runtime = AuditRuntime::new(Config::default());
        assert!(runtime.catalog().load_entries().unwrap().is_empty());

        let orchestrator = runtime.build_orchestrator(&runtime.rule_registry()).unwrap();
        assert!(orchestrator.is_empty());
        assert!(Arc::ptr_eq(orchestrator.memo_registry(), runtime.memo()));
    }
}
