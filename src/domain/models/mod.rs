pub mod catalog;
pub mod config;
pub mod registry;
pub mod rule;

pub use catalog::{RuleCatalogDocument, RuleCatalogEntry};
pub use config::{Config, LoggingConfig, MemoConfig, OrchestratorConfig};
pub use registry::{AuditSummary, RuleCheckOutcome, RuleRecord};
pub use rule::{
    ApiCall, Classification, FixOutcome, FixParameter, FixParameterValue, ResourceFailure,
    RuleErrorEntry, RuleMetadata, RuleStats, RuleStatus,
};
