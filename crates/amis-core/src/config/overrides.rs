//! Configuration overrides parsed from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_overrides_schema;
use super::{HarmThresholds, InputLimits};
use crate::lexicon::LexiconError;
use crate::types::Tier;

/// Errors that can occur while building an engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration does not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("Domain '{domain}' listed in tier {first_tier} and tier {second_tier}")]
    DuplicateDomain {
        domain: String,
        first_tier: u8,
        second_tier: u8,
    },

    #[error("Invalid lexicon entry: {0}")]
    InvalidPattern(#[from] LexiconError),

    #[error("Invalid harm thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Empty entry: {0}")]
    EmptyEntry(String),
}

/// A registry entry supplied through configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Domain, optionally followed by a path prefix
    pub pattern: String,

    /// Display name recorded on matching sources
    pub name: String,
}

/// Extra registry entries per tier.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryOverrides {
    #[serde(default)]
    pub tier1: Vec<RegistryEntry>,

    #[serde(default)]
    pub tier2: Vec<RegistryEntry>,

    #[serde(default)]
    pub tier3: Vec<RegistryEntry>,

    #[serde(default)]
    pub tier4: Vec<RegistryEntry>,

    /// Platforms excluded from medical claims
    #[serde(default)]
    pub tier5: Vec<RegistryEntry>,
}

impl RegistryOverrides {
    /// Entry lists paired with their tier, Tier 1 first.
    pub fn ranked_entries(&self) -> [(Tier, &Vec<RegistryEntry>); 5] {
        [
            (Tier::PrimaryAuthority, &self.tier1),
            (Tier::HighQualityEvidence, &self.tier2),
            (Tier::SupportingEvidence, &self.tier3),
            (Tier::ExpertOpinion, &self.tier4),
            (Tier::Excluded, &self.tier5),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.ranked_entries().iter().all(|(_, e)| e.is_empty())
    }
}

/// Recognised configuration options. Every field is optional; omitted
/// fields keep the built-in behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    /// Extra registry entries per tier
    #[serde(default)]
    pub source_registry_overrides: RegistryOverrides,

    /// Extra red-flag phrases
    #[serde(default)]
    pub red_flag_keywords: Vec<String>,

    /// Extra therapeutic-intent regular expressions
    #[serde(default)]
    pub therapeutic_patterns: Vec<String>,

    /// Extra overconfidence markers
    #[serde(default)]
    pub overconfidence_lexicon: Vec<String>,

    #[serde(default)]
    pub harm_thresholds: Option<HarmThresholds>,

    #[serde(default)]
    pub input_limits: Option<InputLimits>,
}

impl ConfigOverrides {
    /// Parse overrides from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse overrides from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse overrides from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse overrides from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Schema-check a parsed document, then deserialize it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        // YAML with no content parses to null
        if value.is_null() {
            return Ok(Self::default());
        }

        validate_overrides_schema(&value).map_err(ConfigError::Schema)?;
        let overrides: ConfigOverrides = serde_json::from_value(value)?;
        overrides.validate()?;
        Ok(overrides)
    }

    /// Checks the schema cannot express.
    fn validate(&self) -> Result<(), ConfigError> {
        let lists = [
            ("redFlagKeywords", &self.red_flag_keywords),
            ("therapeuticPatterns", &self.therapeutic_patterns),
            ("overconfidenceLexicon", &self.overconfidence_lexicon),
        ];

        for (field, entries) in lists {
            if entries.iter().any(|e| e.trim().is_empty()) {
                return Err(ConfigError::EmptyEntry(format!(
                    "{} contains a blank entry",
                    field
                )));
            }
        }

        if let Some(thresholds) = &self.harm_thresholds {
            thresholds.validate()?;
        }

        Ok(())
    }
}
