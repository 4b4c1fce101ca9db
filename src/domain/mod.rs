//! Domain layer for the audit framework
//!
//! This module contains the rule data model, error types and the port
//! traits implemented by rules, loaders and service clients.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{AuditError, AuditResult};
