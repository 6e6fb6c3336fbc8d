//! Fine-grained feature permissions keyed by `category.feature`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when a feature key string is malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureKeyError {
    #[error("Feature key {0:?} is missing the category separator")]
    MissingSeparator(String),

    #[error("Feature key {0:?} has an empty segment")]
    EmptySegment(String),

    #[error("Feature key {0:?} has more than two segments")]
    TooManySegments(String),
}

/// A validated `category.feature` key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey {
    category: String,
    feature: String,
}

impl FeatureKey {
    pub fn new(category: &str, feature: &str) -> Result<Self, FeatureKeyError> {
        if category.is_empty() || feature.is_empty() {
            return Err(FeatureKeyError::EmptySegment(format!("{}.{}", category, feature)));
        }
        if category.contains('.') || feature.contains('.') {
            return Err(FeatureKeyError::TooManySegments(format!(
                "{}.{}",
                category, feature
            )));
        }

        Ok(Self {
            category: category.to_string(),
            feature: feature.to_string(),
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }
}

impl FromStr for FeatureKey {
    type Err = FeatureKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, feature) = s
            .split_once('.')
            .ok_or_else(|| FeatureKeyError::MissingSeparator(s.to_string()))?;
        FeatureKey::new(category, feature)
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.feature)
    }
}

/// Per-staff feature flags: category -> feature -> granted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeaturePermissions(BTreeMap<String, BTreeMap<String, bool>>);

impl FeaturePermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag for `key`; unset entries are denied
    pub fn is_granted(&self, key: &FeatureKey) -> bool {
        self.0
            .get(key.category())
            .and_then(|features| features.get(key.feature()))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, key: &FeatureKey, granted: bool) {
        self.0
            .entry(key.category().to_string())
            .or_default()
            .insert(key.feature().to_string(), granted);
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, key: &FeatureKey, granted: bool) -> Self {
        self.set(key, granted);
        self
    }

    /// Every stored `(category, feature, granted)` entry, valid or not
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.0.iter().flat_map(|(category, features)| {
            features
                .iter()
                .map(move |(feature, granted)| (category.as_str(), feature.as_str(), *granted))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_key() {
        let key: FeatureKey = "inventory.manage_inventory".parse().expect("valid key");
        assert_eq!(key.category(), "inventory");
        assert_eq!(key.feature(), "manage_inventory");
        assert_eq!(key.to_string(), "inventory.manage_inventory");
    }

    #[test]
    fn test_reject_malformed_keys() {
        assert_eq!(
            "inventory".parse::<FeatureKey>(),
            Err(FeatureKeyError::MissingSeparator("inventory".into()))
        );
        assert!(matches!(
            ".manage".parse::<FeatureKey>(),
            Err(FeatureKeyError::EmptySegment(_))
        ));
        assert!(matches!(
            "library.books.issue".parse::<FeatureKey>(),
            Err(FeatureKeyError::TooManySegments(_))
        ));
    }

    #[test]
    fn test_unset_flags_are_denied() {
        let key: FeatureKey = "library.issue_books".parse().expect("valid key");
        let permissions = FeaturePermissions::new();
        assert!(!permissions.is_granted(&key));

        let permissions = permissions.with(&key, true);
        assert!(permissions.is_granted(&key));
    }

    #[test]
    fn test_nested_json_shape() {
        let permissions: FeaturePermissions =
            serde_json::from_str(r#"{"inventory":{"manage_inventory":false,"view_inventory":true}}"#)
                .expect("permissions should parse");

        let view: FeatureKey = "inventory.view_inventory".parse().expect("valid key");
        let manage: FeatureKey = "inventory.manage_inventory".parse().expect("valid key");
        assert!(permissions.is_granted(&view));
        assert!(!permissions.is_granted(&manage));
        assert_eq!(permissions.entries().count(), 2);
    }
}
