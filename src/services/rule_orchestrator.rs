//! Rule orchestrator.
//!
//! Loads rules and their catalog metadata once, runs checks individually or
//! as a concurrent batch, mirrors each rule's settled statistics into a
//! registry record, and routes fix requests. A failure in one rule (error,
//! panic or timeout) is confined to that rule's record; batch operations
//! never fail because of it.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{mpsc, RwLock, Semaphore};

use crate::adapters::memo::MemoRegistry;
use crate::domain::errors::{AuditError, AuditResult};
use crate::domain::models::{
    AuditSummary, FixOutcome, FixParameterValue, OrchestratorConfig, ResourceFailure,
    RuleCatalogEntry, RuleCheckOutcome, RuleRecord, RuleStatus,
};
use crate::domain::ports::{CatalogSource, Rule, RuleLoader};
use crate::infrastructure::logging::scrub_secrets;
use crate::services::rule_support::validate_fix_parameters;

/// A loaded rule and its registry record.
struct RegisteredRule {
    rule: Arc<dyn Rule>,
    record: Arc<RwLock<RuleRecord>>,
}

/// Registry and scheduler for every loaded rule.
pub struct RuleOrchestrator {
    rules: Vec<RegisteredRule>,
    index: HashMap<String, usize>,
    orphaned_catalog_entries: Vec<RuleCatalogEntry>,
    memo: Arc<MemoRegistry>,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for RuleOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleOrchestrator")
            .field("rules", &self.rule_names())
            .field("orphaned_catalog_entries", &self.orphaned_catalog_entries.len())
            .field("config", &self.config)
            .finish()
    }
}

impl RuleOrchestrator {
    /// Load every rule and merge catalog metadata into the registry.
    ///
    /// Registration order is the loader's order. A rule with no catalog
    /// entry keeps its own metadata; a catalog entry with no rule is kept
    /// aside as orphaned. Both are startup errors when
    /// `config.strict_catalog` is set.
    pub fn new(
        loader: &dyn RuleLoader,
        catalog: &dyn CatalogSource,
        memo: Arc<MemoRegistry>,
        config: OrchestratorConfig,
    ) -> AuditResult<Self> {
        let loaded = loader.load_rules()?;
        let entries = catalog.load_entries()?;

        let mut catalog_by_name: HashMap<&str, &RuleCatalogEntry> = HashMap::new();
        for entry in &entries {
            if catalog_by_name.insert(entry.name.as_str(), entry).is_some() {
                tracing::warn!(rule = %entry.name, "duplicate catalog entry, last one wins");
            }
        }

        let mut rules = Vec::with_capacity(loaded.len());
        let mut index = HashMap::with_capacity(loaded.len());
        let mut uncataloged = Vec::new();

        for (order, rule) in loaded.into_iter().enumerate() {
            let name = rule.name().to_string();
            if index.contains_key(&name) {
                return Err(AuditError::DuplicateRule(name));
            }

            let metadata = match catalog_by_name.get(name.as_str()) {
                Some(entry) => entry.apply_to(rule.metadata().clone()),
                None => {
                    uncataloged.push(name.clone());
                    rule.metadata().clone()
                }
            };

            index.insert(name, order);
            rules.push(RegisteredRule {
                rule,
                record: Arc::new(RwLock::new(RuleRecord::new(order, metadata))),
            });
        }

        let orphaned_catalog_entries: Vec<RuleCatalogEntry> = {
            let mut seen = HashSet::new();
            entries
                .iter()
                .filter(|e| !index.contains_key(&e.name) && seen.insert(e.name.clone()))
                .cloned()
                .collect()
        };

        if config.strict_catalog && (!uncataloged.is_empty() || !orphaned_catalog_entries.is_empty())
        {
            let orphaned: Vec<&str> = orphaned_catalog_entries
                .iter()
                .map(|e| e.name.as_str())
                .collect();
            return Err(AuditError::CatalogMismatch(format!(
                "rules without catalog entries: [{}]; catalog entries without rules: [{}]",
                uncataloged.join(", "),
                orphaned.join(", ")
            )));
        }
        for name in &uncataloged {
            tracing::warn!(rule = %name, "rule has no catalog entry, using its own metadata");
        }
        for entry in &orphaned_catalog_entries {
            tracing::warn!(rule = %entry.name, "catalog entry has no loaded rule, it will not run");
        }

        tracing::info!(
            rules = rules.len(),
            catalog_entries = entries.len(),
            orphaned = orphaned_catalog_entries.len(),
            "rule orchestrator initialized"
        );

        Ok(Self {
            rules,
            index,
            orphaned_catalog_entries,
            memo,
            config,
        })
    }

    fn lookup(&self, name: &str) -> AuditResult<&RegisteredRule> {
        self.index
            .get(name)
            .map(|&i| &self.rules[i])
            .ok_or_else(|| AuditError::RuleNotFound(name.to_string()))
    }

    fn check_timeout(&self) -> Option<Duration> {
        (self.config.check_timeout_secs > 0)
            .then(|| Duration::from_secs(self.config.check_timeout_secs))
    }

    /// Run one rule's check and mirror its outcome into the registry.
    ///
    /// Only an unknown name is an error; a failing check is reported
    /// through the returned outcome and the rule's record.
    pub async fn run_check_once(&self, name: &str) -> AuditResult<RuleCheckOutcome> {
        let registered = self.lookup(name)?;
        registered.record.write().await.begin_check();
        Ok(execute_check(
            Arc::clone(&registered.rule),
            Arc::clone(&registered.record),
            self.check_timeout(),
        )
        .await)
    }

    /// Run every rule's check concurrently.
    pub async fn run_check_all(&self) -> Vec<RuleCheckOutcome> {
        self.run_check_all_with(|_| {}).await
    }

    /// Run every rule's check concurrently, calling `on_rule_finished` as
    /// each one settles.
    ///
    /// Every record is set to `Checking` before any check starts. Outcomes
    /// are returned, and the callback invoked, in completion order.
    pub async fn run_check_all_with<F>(&self, on_rule_finished: F) -> Vec<RuleCheckOutcome>
    where
        F: Fn(&RuleCheckOutcome),
    {
        for registered in &self.rules {
            registered.record.write().await.begin_check();
        }

        let started = Instant::now();
        let semaphore = (self.config.max_concurrent_checks > 0)
            .then(|| Arc::new(Semaphore::new(self.config.max_concurrent_checks)));
        let timeout = self.check_timeout();
        let (tx, mut rx) = mpsc::channel::<RuleCheckOutcome>(self.rules.len().max(1));

        for registered in &self.rules {
            let rule = Arc::clone(&registered.rule);
            let record = Arc::clone(&registered.record);
            let semaphore = semaphore.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let outcome = execute_check(rule, record, timeout).await;
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(self.rules.len());
        while let Some(outcome) = rx.recv().await {
            on_rule_finished(&outcome);
            outcomes.push(outcome);
        }

        // a task that died before reporting leaves its record in Checking
        if outcomes.len() < self.rules.len() {
            let reported: HashSet<String> = outcomes.iter().map(|o| o.name.clone()).collect();
            for registered in &self.rules {
                let name = registered.rule.name();
                if reported.contains(name) {
                    continue;
                }
                let mut record = registered.record.write().await;
                record.record_failure("check task aborted before reporting");
                let outcome = RuleCheckOutcome {
                    name: name.to_string(),
                    status: RuleStatus::Error,
                    duration_ms: 0,
                };
                on_rule_finished(&outcome);
                outcomes.push(outcome);
            }
        }

        let errored = outcomes
            .iter()
            .filter(|o| o.status == RuleStatus::Error)
            .count();
        tracing::info!(
            rules = outcomes.len(),
            errored,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "check pass completed"
        );
        outcomes
    }

    /// Fix every resource the registry lists as non-compliant for `name`.
    ///
    /// Only caller errors are returned as `Err`. A fix that fails as a whole
    /// is recorded on the rule and reported with every resource failed.
    pub async fn run_fix(
        &self,
        name: &str,
        parameters: &[FixParameterValue],
    ) -> AuditResult<FixOutcome> {
        let registered = self.lookup(name)?;
        let non_compliant = registered
            .record
            .read()
            .await
            .stats
            .non_compliant_resources
            .clone();
        self.apply_fix(registered, &non_compliant, parameters).await
    }

    /// Fix a caller-chosen subset of the rule's non-compliant resources.
    pub async fn run_fix_for(
        &self,
        name: &str,
        resource_ids: &[String],
        parameters: &[FixParameterValue],
    ) -> AuditResult<FixOutcome> {
        let registered = self.lookup(name)?;
        {
            let record = registered.record.read().await;
            let known = &record.stats.non_compliant_resources;
            if let Some(unknown) = resource_ids.iter().find(|id| !known.contains(id)) {
                return Err(AuditError::UnknownResource {
                    rule: name.to_string(),
                    resource_id: unknown.clone(),
                });
            }
        }
        self.apply_fix(registered, resource_ids, parameters).await
    }

    async fn apply_fix(
        &self,
        registered: &RegisteredRule,
        resource_ids: &[String],
        parameters: &[FixParameterValue],
    ) -> AuditResult<FixOutcome> {
        let metadata = registered.rule.metadata();
        validate_fix_parameters(metadata, parameters)?;

        if metadata.is_fix_dangerous {
            tracing::warn!(
                rule = %metadata.name,
                resources = resource_ids.len(),
                "applying destructive fix"
            );
        } else {
            tracing::info!(rule = %metadata.name, resources = resource_ids.len(), "applying fix");
        }

        let result = registered.rule.fix(resource_ids, parameters).await;

        let rule_stats = registered.rule.stats().await;
        let mut record = registered.record.write().await;
        record.mirror_errors(&rule_stats);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) if err.is_caller_error() => {
                tracing::warn!(rule = %metadata.name, error = %err, "fix rejected");
                return Err(err);
            }
            Err(err) => {
                let message = scrub_secrets(&err.to_string());
                tracing::warn!(rule = %metadata.name, error = %message, "fix failed");
                record.record_failure(format!("fix failed: {message}"));
                // the rule gave up as a whole, so no resource counts as remediated
                FixOutcome {
                    attempted: resource_ids.len(),
                    remediated: Vec::new(),
                    failed: resource_ids
                        .iter()
                        .map(|id| ResourceFailure {
                            resource_id: id.clone(),
                            message: message.clone(),
                        })
                        .collect(),
                }
            }
        };
        if !outcome.is_success() {
            record.stats.status = RuleStatus::Error;
        }
        Ok(outcome)
    }

    /// Loaded rule by name.
    pub fn rule(&self, name: &str) -> Option<Arc<dyn Rule>> {
        self.lookup(name).ok().map(|r| Arc::clone(&r.rule))
    }

    /// Snapshot of a rule's registry record.
    pub async fn rule_metadata(&self, name: &str) -> Option<RuleRecord> {
        match self.lookup(name) {
            Ok(registered) => Some(registered.record.read().await.clone()),
            Err(_) => None,
        }
    }

    /// All loaded rules in registration order.
    pub fn rules(&self) -> Vec<Arc<dyn Rule>> {
        self.rules.iter().map(|r| Arc::clone(&r.rule)).collect()
    }

    /// Snapshots of every registry record in registration order.
    pub async fn rule_metadatas(&self) -> Vec<RuleRecord> {
        let mut records = Vec::with_capacity(self.rules.len());
        for registered in &self.rules {
            records.push(registered.record.read().await.clone());
        }
        records
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Catalog entries that matched no loaded rule.
    pub fn orphaned_catalog_entries(&self) -> &[RuleCatalogEntry] {
        &self.orphaned_catalog_entries
    }

    pub async fn summary(&self) -> AuditSummary {
        let records = self.rule_metadatas().await;
        AuditSummary::from_records(&records)
    }

    /// Clear all memoized responses before a new audit pass.
    pub async fn reset_memoized_calls(&self) {
        self.memo.reset().await;
    }

    /// Reset every rule's statistics and registry record.
    pub async fn clear_all_stats(&self) {
        for registered in &self.rules {
            registered.rule.clear_stats().await;
            registered.record.write().await.clear();
        }
    }

    pub fn memo_registry(&self) -> &Arc<MemoRegistry> {
        &self.memo
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}

/// Run a rule's check, isolating errors, panics and timeouts, and mirror
/// the settled result into its record.
async fn execute_check(
    rule: Arc<dyn Rule>,
    record: Arc<RwLock<RuleRecord>>,
    timeout: Option<Duration>,
) -> RuleCheckOutcome {
    let name = rule.name().to_string();
    let start = Instant::now();
    tracing::debug!(rule = %name, "check started");

    let guarded = AssertUnwindSafe(rule.check()).catch_unwind();
    let settled = match timeout {
        Some(limit) => tokio::time::timeout(limit, guarded).await.ok(),
        None => Some(guarded.await),
    };

    let failure = match settled {
        None => Some(
            AuditError::CheckTimedOut {
                rule: name.clone(),
                timeout_secs: timeout.map_or(0, |d| d.as_secs()),
            }
            .to_string(),
        ),
        Some(Err(panic)) => Some(format!("check panicked: {}", panic_message(panic.as_ref()))),
        Some(Ok(Err(err))) => Some(err.to_string()),
        Some(Ok(Ok(()))) => None,
    };

    let rule_stats = rule.stats().await;
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut record = record.write().await;
    record.mirror_errors(&rule_stats);
    match failure {
        Some(message) => {
            let message = scrub_secrets(&message);
            tracing::warn!(rule = %name, error = %message, "check failed");
            record.record_failure(message);
        }
        None => {
            record.mirror_check(&rule_stats);
            tracing::info!(
                rule = %name,
                status = %record.stats.status,
                compliant = record.stats.compliant_resources.len(),
                non_compliant = record.stats.non_compliant_resources.len(),
                duration_ms,
                "check finished"
            );
        }
    }
    record.last_checked_at = Some(Utc::now());
    record.last_check_duration_ms = Some(duration_ms);

    RuleCheckOutcome {
        name,
        status: record.stats.status,
        duration_ms,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
