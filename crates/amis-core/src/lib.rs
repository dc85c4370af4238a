//! # amis-core
//!
//! Deterministic compliance validation for medical-information responses.
//!
//! Given a candidate response, the user's query and the sources the response
//! relies on, the engine answers:
//! - Are the sources permitted, and strong enough for the claims made?
//! - Does the language overstate the evidence?
//! - Does the response stay out of treatment decisions and emergencies?
//! - How much harm could it do if returned as-is?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input and configuration always produce the same result
//! 2. **No model calls**: All checks are rule-based
//! 3. **Traceable**: Every text-triggered violation carries its evidence span
//! 4. **Thread-safe**: Configuration is immutable; validation keeps no state
//!
//! ## Example
//!
//! ```rust,ignore
//! use amis_core::{validate, SourceRef};
//!
//! let result = validate(
//!     "Call 911 immediately. Chest pain can signal a heart attack.",
//!     "I have crushing chest pain",
//!     &[SourceRef::new("https://www.heart.org/en/health-topics/heart-attack")],
//! );
//!
//! if result.must_withhold() {
//!     println!("withhold: {:?}", result.recommendations);
//! }
//! ```

pub mod classifier;
pub mod confidence;
pub mod config;
pub mod evidence;
pub mod harm;
pub mod intent;
pub mod lexicon;
pub mod registry;
pub mod shared;
pub mod standards;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use classifier::{normalize, SourceClassifier, SourceMix};
pub use confidence::ConfidenceCalibrator;
pub use config::{
    ConfigError, ConfigOverrides, EngineConfig, HarmThresholds, InputLimits, OversizePolicy,
};
pub use evidence::{EvidenceSource, EvidenceSpan};
pub use harm::{HarmCascade, HarmCascadeAnalyzer, HarmContext, HarmDimension, RiskFactor};
pub use intent::IntentDetector;
pub use lexicon::Lexicons;
pub use registry::{SourceRegistry, TierEntry};
pub use shared::SharedValidator;
pub use standards::{StandardCheck, StandardFinding};
pub use types::{
    ComplianceResult, ConfidenceLevel, HarmAction, HarmAssessment, InputNote, IntentResult,
    Severity, Source, SourceRef, Standard, Tier, Violation, ViolationType,
};
pub use validator::{ComplianceValidator, ValidationReport};

use lazy_static::lazy_static;

lazy_static! {
    static ref DEFAULT_VALIDATOR: ComplianceValidator = ComplianceValidator::default();
}

/// Validate a response with the built-in configuration.
///
/// This is the main entry point for one-off validation. Services that need
/// custom tables or runtime reconfiguration should hold a
/// [`ComplianceValidator`] or [`SharedValidator`] instead.
///
/// # Arguments
///
/// * `response` - The candidate response text
/// * `query` - The user query it answers
/// * `sources` - Sources the response was generated from
///
/// # Returns
///
/// A `ComplianceResult` containing:
/// - `compliant`: false on any violation, any Critical violation, or a Block
/// - `score`: share of applicable standards passed
/// - `violations`: every broken rule with its evidence
/// - `harm_assessment`: four dimension scores and the action
/// - `recommendations`: what to change, in a fixed order
pub fn validate(response: &str, query: &str, sources: &[SourceRef]) -> ComplianceResult {
    DEFAULT_VALIDATOR.validate(response, query, sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_validation() {
        let result = validate(
            "Sleep needs vary between people. A systematic review found most adults do best with seven to nine hours, \
             though the evidence is limited for some groups.",
            "How much sleep do adults need?",
            &[SourceRef::new("https://www.cochranelibrary.com/cdsr/doi/10.1002/x")],
        );

        assert!(result.violations.iter().all(|v| !v.is_critical()));
        assert_eq!(result.harm_assessment.action, HarmAction::Pass);
    }

    #[test]
    fn test_tier_five_source_blocks_compliance() {
        let result = validate(
            "Stretching helps. Talk to your doctor.",
            "",
            &[SourceRef::new("https://www.tiktok.com/@coach/video/1")],
        );

        assert!(!result.compliant);
        assert!(result.has_critical());
        assert_eq!(result.violations_for(Standard::SourceHierarchy).count(), 2);
    }
}
