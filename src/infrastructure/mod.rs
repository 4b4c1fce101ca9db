//! Infrastructure layer module
//!
//! This module contains the ambient infrastructure around the audit core:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Start-up wiring of the memo registry, catalog and orchestrator
//!
//! Infrastructure code returns `anyhow` errors where it only reports
//! set-up failures to an operator.

pub mod config;
pub mod logging;
pub mod setup;
