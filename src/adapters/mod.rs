//! Adapters between the audit core and external systems.

pub mod catalog;
pub mod memo;
