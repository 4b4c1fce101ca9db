//! External service client port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::AuditResult;

/// An outgoing call: the logical operation and its full input payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub operation: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

impl ServiceRequest {
    pub fn new(operation: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            operation: operation.into(),
            input,
        }
    }

    /// A request with no input payload.
    pub fn operation(operation: impl Into<String>) -> Self {
        Self::new(operation, serde_json::Value::Null)
    }
}

/// A client for one external cloud service.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Issue a call and return the raw response.
    async fn send(&self, request: &ServiceRequest) -> AuditResult<serde_json::Value>;

    /// Identity used to share one memoizer between instances of the same
    /// client. Defaults to the implementing type's name.
    fn namespace(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}
