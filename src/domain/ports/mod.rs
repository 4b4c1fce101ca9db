//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces the audit core depends on:
//! - Rule: the unit-of-work contract every audited condition implements
//! - RuleLoader / CatalogSource: start-up collaborators that supply rules
//!   and their declarative metadata
//! - ServiceClient: an external cloud service the rules read from
//!
//! These traits keep the orchestrator independent of concrete rules and
//! cloud SDKs.

pub mod catalog_source;
pub mod rule;
pub mod rule_loader;
pub mod service_client;

pub use catalog_source::CatalogSource;
pub use rule::Rule;
pub use rule_loader::RuleLoader;
pub use service_client::{ServiceClient, ServiceRequest};
