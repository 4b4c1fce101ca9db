//! Declarative rule catalog records.
//!
//! Catalog entries are maintained outside the rule implementations and let
//! operators override presentation metadata (priority, labels, wording)
//! without touching rule code.

use serde::{Deserialize, Serialize};

use super::rule::RuleMetadata;

/// One declarative metadata record, matched to a loaded rule by `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCatalogEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_practice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice_before_fix: Option<String>,
}

impl RuleCatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Overlay the fields this entry sets onto rule-supplied metadata.
    pub fn apply_to(&self, mut metadata: RuleMetadata) -> RuleMetadata {
        if let Some(ref description) = self.description {
            metadata.description = description.clone();
        }
        if let Some(priority) = self.priority {
            metadata.priority = priority;
        }
        if let Some(ref reason) = self.priority_reason {
            metadata.priority_reason = reason.clone();
        }
        if let Some(ref service) = self.service {
            metadata.service = service.clone();
        }
        if let Some(ref category) = self.category {
            metadata.category = category.clone();
        }
        if let Some(ref best_practice) = self.best_practice {
            metadata.best_practice = best_practice.clone();
        }
        if let Some(ref advice) = self.advice_before_fix {
            metadata.advice_before_fix = advice.clone();
        }
        metadata
    }
}

/// Top-level shape of a YAML catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCatalogDocument {
    #[serde(default)]
    pub rules: Vec<RuleCatalogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides_only_set_fields() {
        let metadata = RuleMetadata::new("IamRootMfa")
            .with_description("Root account should use MFA")
            .with_priority(2, "Account takeover")
            .with_taxonomy("IAM", "Identity", "Enable MFA");

        let entry = RuleCatalogEntry {
            name: "IamRootMfa".to_string(),
            priority: Some(0),
            category: Some("Security".to_string()),
            ..Default::default()
        };

        let merged = entry.apply_to(metadata);
        assert_eq!(merged.priority, 0);
        assert_eq!(merged.category, "Security");
        assert_eq!(merged.description, "Root account should use MFA");
        assert_eq!(merged.priority_reason, "Account takeover");
        assert_eq!(merged.service, "IAM");
    }

    #[test]
    fn test_catalog_document_yaml() {
        let yaml = r"
rules:
  - name: S3BucketVersioning
    priority: 3
    service: S3
  - name: IamRootMfa
";
        let doc: RuleCatalogDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.rules.len(), 2);
        assert_eq!(doc.rules[0].priority, Some(3));
        assert_eq!(doc.rules[1].service, None);
    }
}
