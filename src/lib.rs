//! Cloud Auditor - Rule Execution Framework
//!
//! Audits cloud resources against a catalog of independent best-practice
//! rules and optionally remediates violations. Each rule discovers its own
//! resources, classifies them as compliant or non-compliant, and can apply
//! a fix.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): rule models, errors and port traits
//! - **Adapters** (`adapters`): call memoization and catalog sources
//! - **Service Layer** (`services`): rule support, registration and the orchestrator
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, start-up wiring
//!
//! # Example
//!
//! ```ignore
//! use cloud_auditor::infrastructure::config::ConfigLoader;
//! use cloud_auditor::infrastructure::setup::AuditRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = AuditRuntime::new(ConfigLoader::load()?);
//!     let registry = runtime.rule_registry(); // .register("S3BucketVersioning", ...)
//!     let orchestrator = runtime.build_orchestrator(&registry)?;
//!
//!     orchestrator.reset_memoized_calls().await;
//!     orchestrator
//!         .run_check_all_with(|outcome| println!("{} -> {}", outcome.name, outcome.status))
//!         .await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::memo::{Fingerprint, MemoRegistry, MemoizedClient, Memoizer};
pub use domain::errors::{AuditError, AuditResult};
pub use domain::models::{
    ApiCall, AuditSummary, Classification, Config, FixOutcome, FixParameter, FixParameterValue,
    RuleCatalogEntry, RuleCheckOutcome, RuleMetadata, RuleRecord, RuleStats, RuleStatus,
};
pub use domain::ports::{CatalogSource, Rule, RuleLoader, ServiceClient, ServiceRequest};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{RuleOrchestrator, RuleRegistry, RuleState};
