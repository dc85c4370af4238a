//! Shared validator handle with atomic configuration replacement.
//!
//! Readers take a cheap `Arc` snapshot and validate without holding the
//! lock, so a replacement never blocks or alters an in-flight call. A failed
//! reload leaves the previous validator in place.

use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

use crate::config::{ConfigError, EngineConfig};
use crate::types::{ComplianceResult, SourceRef};
use crate::validator::ComplianceValidator;

/// A validator that can be swapped while other threads use it.
#[derive(Debug)]
pub struct SharedValidator {
    current: RwLock<Arc<ComplianceValidator>>,
}

impl SharedValidator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(ComplianceValidator::new(config))),
        }
    }

    /// The validator in effect right now.
    pub fn snapshot(&self) -> Arc<ComplianceValidator> {
        Arc::clone(&self.current.read())
    }

    /// Install a new configuration, returning the validator it replaced.
    pub fn replace(&self, config: EngineConfig) -> Arc<ComplianceValidator> {
        let next = Arc::new(ComplianceValidator::new(config));
        let previous = std::mem::replace(&mut *self.current.write(), next);
        tracing::info!(
            registry_entries = previous.config().registry.len(),
            "Replaced validator configuration"
        );
        previous
    }

    /// Rebuild from a YAML overrides file. On error the current
    /// configuration stays in effect.
    pub fn reload_yaml_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        match EngineConfig::from_yaml_file(path) {
            Ok(config) => {
                self.replace(config);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Config reload failed, keeping previous configuration");
                Err(e)
            }
        }
    }

    /// Validate with the current snapshot.
    pub fn validate(&self, response: &str, query: &str, sources: &[SourceRef]) -> ComplianceResult {
        self.snapshot().validate(response, query, sources)
    }
}

impl Default for SharedValidator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarmThresholds;
    use crate::types::HarmAction;
    use std::thread;

    #[test]
    fn test_snapshot_survives_replace() {
        let shared = SharedValidator::default();
        let before = shared.snapshot();

        let config = EngineConfig {
            harm_thresholds: HarmThresholds { block: 2, warn: 1 },
            ..EngineConfig::default()
        };
        let previous = shared.replace(config);

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.config().harm_thresholds, HarmThresholds::default());
        assert_eq!(shared.snapshot().config().harm_thresholds.block, 2);
    }

    #[test]
    fn test_replacement_changes_verdicts() {
        let shared = SharedValidator::default();
        let response = "Take 5mg of warfarin daily. Talk to your doctor.";

        let before = shared.validate(response, "", &[]);
        assert_eq!(before.harm_assessment.action, HarmAction::Warn);

        shared.replace(EngineConfig {
            harm_thresholds: HarmThresholds { block: 5, warn: 3 },
            ..EngineConfig::default()
        });
        let after = shared.validate(response, "", &[]);
        assert_eq!(after.harm_assessment.action, HarmAction::Block);
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let shared = SharedValidator::default();
        let before = shared.snapshot();

        assert!(shared.reload_yaml_file("/nonexistent/amis.yaml").is_err());
        assert!(Arc::ptr_eq(&before, &shared.snapshot()));
    }

    #[test]
    fn test_concurrent_validation() {
        let shared = Arc::new(SharedValidator::default());
        let expected = shared.validate("Turmeric is a spice.", "What is turmeric?", &[]);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || shared.validate("Turmeric is a spice.", "What is turmeric?", &[]))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
