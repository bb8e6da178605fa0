use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod file_repository;

/// Compliance framework a policy is written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    NistCsf,
    Iso27001,
}

impl Framework {
    pub const ALL: [Framework; 2] = [Framework::NistCsf, Framework::Iso27001];

    /// Directory name used for this framework on disk and as a policy key prefix.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::NistCsf => "nist_csf",
            Self::Iso27001 => "iso27001",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|fw| fw.dir_name() == name)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.dir_name())
    }
}

/// Identifies one generated policy: `<framework>/<category>`, e.g. `iso27001/A.9.2.1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyKey {
    pub framework: Framework,
    pub category: String,
}

impl PolicyKey {
    pub fn new(framework: Framework, category: impl Into<String>) -> Self {
        Self {
            framework,
            category: category.into(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (prefix, category) = raw.split_once('/')?;
        let framework = Framework::from_dir_name(prefix)?;
        if category.trim().is_empty() {
            return None;
        }
        Some(Self::new(framework, category))
    }
}

impl fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.framework.dir_name(), self.category)
    }
}

impl FromStr for PolicyKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("invalid policy key `{s}`"))
    }
}

impl Serialize for PolicyKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PolicyKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid policy key `{raw}`")))
    }
}

/// Reference policy texts grouped by framework.
pub type ReferenceSet = BTreeMap<Framework, Vec<String>>;

/// Generated policy texts keyed by model name, then by policy key.
pub type GeneratedPolicies = BTreeMap<String, BTreeMap<PolicyKey, String>>;

/// Abstraction over reference loading so files, HTTP or in-memory corpora can be swapped.
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Every reference text currently available, grouped by framework.
    async fn load_references(&self) -> AnyResult<ReferenceSet>;

    /// References for a single framework; empty when none exist.
    async fn references_for(&self, framework: Framework) -> AnyResult<Vec<String>> {
        let mut references = self.load_references().await?;
        Ok(references.remove(&framework).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_key_round_trips_through_display() {
        let key = PolicyKey::parse("iso27001/A.9.2.1").expect("valid key");
        assert_eq!(key.framework, Framework::Iso27001);
        assert_eq!(key.category, "A.9.2.1");
        assert_eq!(key.to_string(), "iso27001/A.9.2.1");
    }

    #[test]
    fn policy_key_rejects_unknown_framework_or_blank_category() {
        assert!(PolicyKey::parse("soc2/CC6.1").is_none());
        assert!(PolicyKey::parse("nist_csf/").is_none());
        assert!(PolicyKey::parse("PROTECT").is_none());
        assert!("soc2/CC6.1".parse::<PolicyKey>().is_err());
    }

    #[test]
    fn policy_keys_serialize_as_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(PolicyKey::new(Framework::NistCsf, "PROTECT"), 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"nist_csf/PROTECT":1}"#);
        let back: BTreeMap<PolicyKey, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn framework_dir_names() {
        assert_eq!(Framework::from_dir_name("nist_csf"), Some(Framework::NistCsf));
        assert_eq!(Framework::from_dir_name("iso27001"), Some(Framework::Iso27001));
        assert_eq!(Framework::from_dir_name("NIST_CSF"), None);
    }
}
