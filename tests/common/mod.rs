//! Common test utilities for integration tests
//!
//! Provides a stub service client with invocation counters and a scripted
//! rule whose check/fix behavior is chosen per test.

#![allow(dead_code)]

use async_trait::async_trait;
use cloud_auditor::adapters::memo::{MemoRegistry, MemoizedClient};
use cloud_auditor::domain::models::{
    ApiCall, Classification, FixOutcome, FixParameter, FixParameterValue, RuleMetadata, RuleStats,
};
use cloud_auditor::domain::ports::{Rule, ServiceClient, ServiceRequest};
use cloud_auditor::services::{validate_fix_parameters, RuleState};
use cloud_auditor::{AuditError, AuditResult};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

// ========================
// Stub service client
// ========================

/// Service client answering from a fixed response table.
pub struct StubClient {
    namespace: Option<String>,
    responses: StdMutex<HashMap<String, Value>>,
    failing: StdMutex<HashSet<String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    call_log: StdMutex<Vec<ServiceRequest>>,
}

impl StubClient {
    pub fn new() -> Self {
        Self {
            namespace: None,
            responses: StdMutex::new(HashMap::new()),
            failing: StdMutex::new(HashSet::new()),
            delay: None,
            calls: AtomicUsize::new(0),
            call_log: StdMutex::new(Vec::new()),
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, operation: &str, response: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(operation.to_string(), response);
        self
    }

    /// Make calls to `operation` fail until [`recover`](Self::recover).
    pub fn fail(&self, operation: &str) {
        self.failing.lock().unwrap().insert(operation.to_string());
    }

    pub fn recover(&self, operation: &str) {
        self.failing.lock().unwrap().remove(operation);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }
}

#[async_trait]
impl ServiceClient for StubClient {
    async fn send(&self, request: &ServiceRequest) -> AuditResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_log.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(&request.operation) {
            return Err(AuditError::client_call(&request.operation, "service unavailable"));
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&request.operation)
            .cloned()
            .unwrap_or_else(|| json!({"echo": request.input.clone()})))
    }

    fn namespace(&self) -> String {
        self.namespace
            .clone()
            .unwrap_or_else(|| std::any::type_name::<Self>().to_string())
    }
}

/// Second client type, to check isolation by type identity.
pub struct OtherStubClient {
    pub calls: AtomicUsize,
}

impl OtherStubClient {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ServiceClient for OtherStubClient {
    async fn send(&self, _request: &ServiceRequest) -> AuditResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"from": "other"}))
    }
}

// ========================
// Scripted rule
// ========================

/// How a [`ScriptedRule`] check behaves.
#[derive(Debug, Clone)]
pub enum CheckBehavior {
    /// List resources; ids starting with `ok-` are compliant
    Classify,
    /// Return `Err` from `check` without recording anything
    Reject(String),
    /// Panic inside `check`
    Panic,
    /// Sleep before classifying
    Slow(Duration),
}

/// Operation the scripted rule lists resources with.
pub const LIST_OPERATION: &str = "ListResources";
/// Operation the scripted rule remediates with.
pub const REMEDIATE_OPERATION: &str = "Remediate";

/// Rule driven by a [`CheckBehavior`] and backed by a memoized stub client.
pub struct ScriptedRule {
    metadata: RuleMetadata,
    state: RuleState,
    client: MemoizedClient<StubClient>,
    behavior: CheckBehavior,
    failing_fixes: HashSet<String>,
    rejected_fix: Option<String>,
}

impl ScriptedRule {
    pub fn new(name: &str, client: MemoizedClient<StubClient>, behavior: CheckBehavior) -> Self {
        let metadata = RuleMetadata::new(name)
            .with_description(format!("{name} description"))
            .with_priority(2, "test priority")
            .with_taxonomy("Stub", "Testing", "Scripted behavior")
            .with_check_call(ApiCall::new(LIST_OPERATION, "List resources"))
            .with_fix_call(ApiCall::new(REMEDIATE_OPERATION, "Remediate resources"));
        Self {
            state: RuleState::new(name),
            metadata,
            client,
            behavior,
            failing_fixes: HashSet::new(),
            rejected_fix: None,
        }
    }

    pub fn with_fix_parameter(mut self, name: &str) -> Self {
        self.metadata = self
            .metadata
            .with_fix_parameter(FixParameter::new(name, "required by test"));
        self
    }

    pub fn with_dangerous_fix(mut self) -> Self {
        self.metadata = self.metadata.with_dangerous_fix(true);
        self
    }

    pub fn failing_fix_for(mut self, resource_id: &str) -> Self {
        self.failing_fixes.insert(resource_id.to_string());
        self
    }

    /// Make the whole fix fail with a service error carrying `message`.
    pub fn rejecting_fix(mut self, message: &str) -> Self {
        self.rejected_fix = Some(message.to_string());
        self
    }

    async fn discover(&self) -> AuditResult<Classification> {
        let response = self
            .client
            .send(&ServiceRequest::operation(LIST_OPERATION))
            .await?;
        let ids = response["ids"].as_array().cloned().unwrap_or_default();

        let mut classification = Classification::new();
        for id in ids.iter().filter_map(Value::as_str) {
            classification.classify(id, id.starts_with("ok-"));
        }
        Ok(classification)
    }
}

#[async_trait]
impl Rule for ScriptedRule {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    async fn stats(&self) -> RuleStats {
        self.state.snapshot().await
    }

    async fn clear_stats(&self) {
        self.state.clear().await;
    }

    async fn check(&self) -> AuditResult<()> {
        match self.behavior {
            CheckBehavior::Classify => self.state.run_check(self.discover()).await,
            CheckBehavior::Reject(ref message) => Err(AuditError::CheckFailed {
                rule: self.metadata.name.clone(),
                message: message.clone(),
            }),
            CheckBehavior::Panic => panic!("scripted panic in {}", self.metadata.name),
            CheckBehavior::Slow(delay) => {
                self.state
                    .run_check(async {
                        tokio::time::sleep(delay).await;
                        self.discover().await
                    })
                    .await
            }
        }
    }

    async fn fix(
        &self,
        non_compliant_resources: &[String],
        parameters: &[FixParameterValue],
    ) -> AuditResult<FixOutcome> {
        validate_fix_parameters(&self.metadata, parameters)?;
        if let Some(ref message) = self.rejected_fix {
            return Err(AuditError::client_call(REMEDIATE_OPERATION, message.clone()));
        }

        let outcome = self
            .state
            .run_fix(non_compliant_resources, |resource_id| async move {
                self.client
                    .send_uncached(&ServiceRequest::new(
                        REMEDIATE_OPERATION,
                        json!({"id": resource_id}),
                    ))
                    .await?;
                if self.failing_fixes.contains(&resource_id) {
                    return Err(AuditError::client_call(REMEDIATE_OPERATION, "conflict"));
                }
                Ok(())
            })
            .await;
        Ok(outcome)
    }
}

/// Stub client listing the given resource ids.
pub fn listing_client(ids: &[&str]) -> StubClient {
    StubClient::new().respond(LIST_OPERATION, json!({ "ids": ids }))
}

/// Scripted rule with its own namespaced stub client.
pub fn scripted_rule(
    memo: &MemoRegistry,
    name: &str,
    ids: &[&str],
    behavior: CheckBehavior,
) -> (Arc<StubClient>, ScriptedRule) {
    let client = Arc::new(listing_client(ids).with_namespace(name));
    let rule = ScriptedRule::new(name, memo.memo(Arc::clone(&client)), behavior);
    (client, rule)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
