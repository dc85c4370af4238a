//! Engine configuration.
//!
//! An [`EngineConfig`] bundles the registry, lexicons, harm thresholds and
//! input limits a validator runs with. It is built once, either from the
//! built-in tables or from validated [`ConfigOverrides`], and is not mutated
//! afterwards. Replacing configuration at runtime means building a new value
//! (see [`crate::SharedValidator`]).

mod overrides;
mod schema;

pub use overrides::{ConfigError, ConfigOverrides, RegistryEntry, RegistryOverrides};
pub use schema::validate_overrides_schema;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::lexicon::Lexicons;
use crate::registry::SourceRegistry;
use crate::types::HarmAction;

/// Maximum-dimension cut-offs for the harm action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmThresholds {
    /// Max score at or above this blocks the response
    pub block: u8,
    /// Max score at or above this (and below `block`) warns
    pub warn: u8,
}

impl HarmThresholds {
    /// `block` for scores at or above `self.block`, `warn` at or above
    /// `self.warn`, `pass` otherwise.
    pub fn action_for(&self, max_score: u8) -> HarmAction {
        if max_score >= self.block {
            HarmAction::Block
        } else if max_score >= self.warn {
            HarmAction::Warn
        } else {
            HarmAction::Pass
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("block", self.block), ("warn", self.warn)] {
            if !(1..=10).contains(&value) {
                return Err(ConfigError::InvalidThresholds(format!(
                    "{} must be between 1 and 10, got {}",
                    name, value
                )));
            }
        }
        if self.warn > self.block {
            return Err(ConfigError::InvalidThresholds(format!(
                "warn ({}) must not exceed block ({})",
                self.warn, self.block
            )));
        }
        Ok(())
    }
}

impl Default for HarmThresholds {
    fn default() -> Self {
        Self { block: 7, warn: 4 }
    }
}

/// What to do with input text larger than the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Evaluate the first `max_bytes` and attach a note
    #[default]
    Truncate,
    /// Skip evaluation and return a non-compliant result
    Reject,
}

/// Size limits applied to response and query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputLimits {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default)]
    pub oversize: OversizePolicy,
}

/// Default text limit in bytes.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 100_000;

fn default_max_bytes() -> usize {
    DEFAULT_MAX_INPUT_BYTES
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_INPUT_BYTES,
            oversize: OversizePolicy::Truncate,
        }
    }
}

/// Everything a validator needs besides its input.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub registry: SourceRegistry,
    pub lexicons: Lexicons,
    pub harm_thresholds: HarmThresholds,
    pub input_limits: InputLimits,
}

impl EngineConfig {
    /// Merge validated overrides into the built-in tables.
    pub fn from_overrides(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let base = Self::default();

        let registry = base
            .registry
            .with_overrides(&overrides.source_registry_overrides)?;

        let lexicons = base.lexicons.extended(
            &overrides.red_flag_keywords,
            &overrides.therapeutic_patterns,
            &overrides.overconfidence_lexicon,
        )?;

        let harm_thresholds = overrides.harm_thresholds.unwrap_or_default();
        harm_thresholds.validate()?;

        let input_limits = overrides.input_limits.unwrap_or_default();

        tracing::info!(
            registry_entries = registry.len(),
            red_flags = lexicons.red_flags.len(),
            therapeutic_patterns = lexicons.therapeutic.len(),
            block = harm_thresholds.block,
            warn = harm_thresholds.warn,
            max_bytes = input_limits.max_bytes,
            "Built engine configuration from overrides"
        );

        Ok(Self {
            registry,
            lexicons,
            harm_thresholds,
            input_limits,
        })
    }

    /// Build from a YAML overrides document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_overrides(ConfigOverrides::from_yaml(yaml)?)
    }

    /// Build from a JSON overrides document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_overrides(ConfigOverrides::from_json(json)?)
    }

    /// Build from a YAML overrides file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_overrides(ConfigOverrides::from_yaml_file(path)?)
    }

    /// Build from a JSON overrides file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_overrides(ConfigOverrides::from_json_file(path)?)
    }
}
