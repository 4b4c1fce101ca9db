//! Rule catalog sources.

use std::path::{Path, PathBuf};

use crate::domain::errors::{AuditError, AuditResult};
use crate::domain::models::{RuleCatalogDocument, RuleCatalogEntry};
use crate::domain::ports::CatalogSource;

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<RuleCatalogEntry>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<RuleCatalogEntry>) -> Self {
        Self { entries }
    }

    /// A catalog with no entries; every rule keeps its own metadata.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl CatalogSource for StaticCatalog {
    fn load_entries(&self) -> AuditResult<Vec<RuleCatalogEntry>> {
        Ok(self.entries.clone())
    }
}

/// Catalog read from a YAML file with a top-level `rules:` list.
///
/// A missing file yields an empty catalog.
#[derive(Debug, Clone)]
pub struct YamlCatalog {
    path: PathBuf,
}

impl YamlCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse catalog YAML text.
    pub fn parse(yaml: &str) -> AuditResult<Vec<RuleCatalogEntry>> {
        let document: RuleCatalogDocument = serde_yaml::from_str(yaml)?;
        Ok(document.rules)
    }
}

impl CatalogSource for YamlCatalog {
    fn load_entries(&self) -> AuditResult<Vec<RuleCatalogEntry>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "catalog file absent, using empty catalog");
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            AuditError::Catalog(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let entries = Self::parse(&content)?;
        tracing::info!(
            path = %self.path.display(),
            entries = entries.len(),
            "loaded rule catalog"
        );
        Ok(entries)
    }
}
