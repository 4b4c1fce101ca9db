//! Service layer: rule support, registration and orchestration.

pub mod rule_orchestrator;
pub mod rule_registry;
pub mod rule_support;

pub use rule_orchestrator::RuleOrchestrator;
pub use rule_registry::{RuleContext, RuleFactory, RuleRegistry};
pub use rule_support::{parameter_value, validate_fix_parameters, RuleState};
