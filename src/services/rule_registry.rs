//! Static rule registration table.
//!
//! Rules are registered explicitly as `identifier -> factory` pairs and
//! instantiated in registration order when the orchestrator is built.

use std::fmt;
use std::sync::Arc;

use crate::adapters::memo::MemoRegistry;
use crate::domain::errors::{AuditError, AuditResult};
use crate::domain::ports::{Rule, RuleLoader};

/// Shared collaborators handed to every rule factory.
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub memo: Arc<MemoRegistry>,
}

impl RuleContext {
    pub fn new(memo: Arc<MemoRegistry>) -> Self {
        Self { memo }
    }
}

/// Factory producing one rule instance.
pub type RuleFactory = Box<dyn Fn(&RuleContext) -> AuditResult<Arc<dyn Rule>> + Send + Sync>;

/// Ordered table of rule factories; implements [`RuleLoader`].
pub struct RuleRegistry {
    context: RuleContext,
    factories: Vec<(String, RuleFactory)>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("factories", &self.identifiers())
            .finish()
    }
}

impl RuleRegistry {
    pub fn new(context: RuleContext) -> Self {
        Self {
            context,
            factories: Vec::new(),
        }
    }

    /// Register a factory under an identifier.
    pub fn register<F>(mut self, identifier: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&RuleContext) -> AuditResult<Arc<dyn Rule>> + Send + Sync + 'static,
    {
        self.factories.push((identifier.into(), Box::new(factory)));
        self
    }

    /// Register an already constructed rule.
    pub fn register_instance(self, rule: Arc<dyn Rule>) -> Self {
        let identifier = rule.name().to_string();
        self.register(identifier, move |_| Ok(Arc::clone(&rule)))
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.factories.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn context(&self) -> &RuleContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl RuleLoader for RuleRegistry {
    fn load_rules(&self) -> AuditResult<Vec<Arc<dyn Rule>>> {
        self.factories
            .iter()
            .map(|(identifier, factory)| {
                factory(&self.context).map_err(|e| {
                    AuditError::Config(format!("failed to instantiate rule '{identifier}': {e}"))
                })
            })
            .collect()
    }
}
