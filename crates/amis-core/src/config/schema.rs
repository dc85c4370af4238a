//! JSON Schema validation for configuration overrides.
//!
//! Override documents are checked against schema/config-overrides.schema.json
//! before they are deserialized, so unknown options and out-of-range values
//! are reported with their location.

use std::sync::OnceLock;

/// Embedded overrides schema (loaded at compile time).
const OVERRIDES_SCHEMA_JSON: &str = include_str!("../../../../schema/config-overrides.schema.json");

/// Compiled validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(OVERRIDES_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result.as_ref().map_err(Clone::clone)
}

/// Validate an overrides document against the schema.
///
/// Returns every validation error, each with its JSON pointer.
pub fn validate_overrides_schema(value: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_passes() {
        assert!(validate_overrides_schema(&serde_json::json!({})).is_ok());
    }

    #[test]
    fn test_full_document_passes() {
        let value = serde_json::json!({
            "sourceRegistryOverrides": {
                "tier2": [{ "pattern": "example-journal.org", "name": "Example Journal" }],
                "tier5": [{ "pattern": "patient.example/forums", "name": "Forum" }]
            },
            "redFlagKeywords": ["blue lips"],
            "therapeuticPatterns": ["\\bcan my child take\\b"],
            "overconfidenceLexicon": ["miracle"],
            "harmThresholds": { "block": 8, "warn": 5 },
            "inputLimits": { "maxBytes": 50000, "oversize": "truncate" }
        });
        assert!(validate_overrides_schema(&value).is_ok());
    }

    #[test]
    fn test_entry_without_name_fails() {
        let value = serde_json::json!({
            "sourceRegistryOverrides": { "tier1": [{ "pattern": "example.org" }] }
        });
        let errors = validate_overrides_schema(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/sourceRegistryOverrides/tier1/0")));
    }

    #[test]
    fn test_unknown_tier_key_fails() {
        let value = serde_json::json!({
            "sourceRegistryOverrides": { "tier6": [] }
        });
        assert!(validate_overrides_schema(&value).is_err());
    }

    #[test]
    fn test_invalid_oversize_policy_fails() {
        let value = serde_json::json!({
            "inputLimits": { "oversize": "drop" }
        });
        assert!(validate_overrides_schema(&value).is_err());
    }
}
