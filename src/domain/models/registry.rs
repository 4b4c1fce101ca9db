//! Orchestrator-side views of registered rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rule::{RuleErrorEntry, RuleMetadata, RuleStats, RuleStatus};

/// Registry record pairing merged metadata with mirrored statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Presentation order, equal to the loader's discovery order
    pub order: usize,
    pub metadata: RuleMetadata,
    pub stats: RuleStats,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_check_duration_ms: Option<u64>,
    /// Last rule error entry copied into `stats`.
    #[serde(skip)]
    pub(crate) last_mirrored_error: Option<RuleErrorEntry>,
}

impl RuleRecord {
    pub fn new(order: usize, metadata: RuleMetadata) -> Self {
        Self {
            order,
            metadata,
            stats: RuleStats::new(),
            last_checked_at: None,
            last_check_duration_ms: None,
            last_mirrored_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn status(&self) -> RuleStatus {
        self.stats.status
    }

    /// Mark a check as started.
    pub(crate) fn begin_check(&mut self) {
        self.stats.status = RuleStatus::Checking;
    }

    /// Record a failure observed by the orchestrator itself.
    pub(crate) fn record_failure(&mut self, message: impl Into<String>) {
        self.stats.status = RuleStatus::Error;
        self.stats.errors.push(RuleErrorEntry::new(message));
    }

    /// Copy a settled rule's statistics into this record.
    ///
    /// Resource lists are replaced. Error entries the record has not yet
    /// seen are appended, so the record's log is never truncated.
    pub(crate) fn mirror_check(&mut self, rule_stats: &RuleStats) {
        self.stats.compliant_resources = rule_stats.compliant_resources.clone();
        self.stats.non_compliant_resources = rule_stats.non_compliant_resources.clone();
        self.stats.status = if rule_stats.status == RuleStatus::Error {
            RuleStatus::Error
        } else {
            RuleStatus::Finished
        };
        self.mirror_errors(rule_stats);
    }

    /// Append rule error entries not yet mirrored.
    ///
    /// Entries after the last mirrored one are copied. If that entry is no
    /// longer in the rule's log, the log was cleared and every entry is new.
    pub(crate) fn mirror_errors(&mut self, rule_stats: &RuleStats) {
        let start = self
            .last_mirrored_error
            .as_ref()
            .and_then(|last| rule_stats.errors.iter().rposition(|e| e == last))
            .map_or(0, |i| i + 1);
        self.stats
            .errors
            .extend(rule_stats.errors[start..].iter().cloned());
        self.last_mirrored_error = rule_stats.errors.last().cloned();
    }

    /// Reset mirrored statistics to the initial state.
    pub(crate) fn clear(&mut self) {
        self.stats = RuleStats::new();
        self.last_checked_at = None;
        self.last_check_duration_ms = None;
        self.last_mirrored_error = None;
    }
}

/// Result of one rule's check within a batch, in completion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheckOutcome {
    pub name: String,
    pub status: RuleStatus,
    pub duration_ms: u64,
}

/// Aggregate view across every registered rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_rules: usize,
    pub loaded: usize,
    pub checking: usize,
    pub finished: usize,
    pub errored: usize,
    pub compliant_resources: usize,
    pub non_compliant_resources: usize,
}

impl AuditSummary {
    /// Build a summary from registry records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RuleRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total_rules += 1;
            match record.stats.status {
                RuleStatus::Loaded => summary.loaded += 1,
                RuleStatus::Checking => summary.checking += 1,
                RuleStatus::Finished => summary.finished += 1,
                RuleStatus::Error => summary.errored += 1,
            }
            summary.compliant_resources += record.stats.compliant_resources.len();
            summary.non_compliant_resources += record.stats.non_compliant_resources.len();
        }
        summary
    }

    /// Fraction of checked resources that are compliant.
    #[allow(clippy::cast_precision_loss)]
    pub fn compliance_rate(&self) -> f64 {
        let total = self.compliant_resources + self.non_compliant_resources;
        if total == 0 {
            return 1.0;
        }
        self.compliant_resources as f64 / total as f64
    }
}
