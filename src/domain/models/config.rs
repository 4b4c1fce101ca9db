use serde::{Deserialize, Serialize};

/// Main configuration structure for the auditor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Rule orchestrator configuration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Call memoization configuration
    #[serde(default)]
    pub memo: MemoConfig,

    /// Path to a YAML rule catalog (optional)
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rule orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestratorConfig {
    /// Maximum checks in flight during a batch (0 = unbounded)
    #[serde(default = "default_max_concurrent_checks")]
    pub max_concurrent_checks: usize,

    /// Per-rule check timeout in seconds (0 = no timeout)
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,

    /// Fail construction when loaded rules and catalog entries disagree
    #[serde(default)]
    pub strict_catalog: bool,
}

const fn default_max_concurrent_checks() -> usize {
    16
}

const fn default_check_timeout_secs() -> u64 {
    300
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: default_max_concurrent_checks(),
            check_timeout_secs: default_check_timeout_secs(),
            strict_catalog: false,
        }
    }
}

/// Call memoization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoConfig {
    /// Share one upstream call between identical in-flight reads
    #[serde(default = "default_coalesce_in_flight")]
    pub coalesce_in_flight: bool,

    /// Maximum cached responses per memoizer
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

const fn default_coalesce_in_flight() -> bool {
    true
}

const fn default_max_entries() -> u64 {
    10_000
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            coalesce_in_flight: default_coalesce_in_flight(),
            max_entries: default_max_entries(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
