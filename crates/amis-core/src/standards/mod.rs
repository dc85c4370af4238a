//! The five content standards.
//!
//! Each standard is a check that answers one question about a candidate
//! response:
//!
//! | Standard | Question |
//! |----------|----------|
//! | **1. Literature Review** | Does the response rest on appraised literature? |
//! | **2. Source Hierarchy** | Are the cited sources permitted and of adequate tier? |
//! | **3. Uncertainty Disclosure** | Does the language match the strength of the evidence? |
//! | **4. Dissent Labeling** | Is dissent acknowledged without false certainty? |
//! | **5. Therapeutic Scope** | Does the response defer therapy and emergencies to clinicians? |
//!
//! Checks are stateless. A check that is not applicable to a response
//! neither passes nor fails and is left out of the score.

mod dissent;
mod hierarchy;
mod literature;
mod therapeutic;
mod uncertainty;

pub use dissent::DissentLabelingCheck;
pub use hierarchy::SourceHierarchyCheck;
pub use literature::LiteratureReviewCheck;
pub use therapeutic::TherapeuticScopeCheck;
pub use uncertainty::UncertaintyDisclosureCheck;

use serde::Serialize;

use crate::lexicon::Lexicons;
use crate::types::{ConfidenceLevel, IntentResult, Source, Standard, Violation};

/// Everything a check may look at.
pub struct ValidationContext<'a> {
    pub response: &'a str,
    pub query: &'a str,
    /// Cited sources first, in input order, then embedded ones
    pub sources: &'a [Source],
    pub intent: &'a IntentResult,
    pub required_confidence: ConfidenceLevel,
    pub lexicons: &'a Lexicons,
}

/// Trait implemented by every standard check.
pub trait StandardCheck {
    /// The standard this check enforces.
    fn standard(&self) -> Standard;

    /// The question this check answers.
    fn question(&self) -> &'static str {
        self.standard().question()
    }

    /// Whether the standard applies to this response at all.
    fn is_applicable(&self, ctx: &ValidationContext<'_>) -> bool;

    /// Violations of the standard, in order of discovery.
    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Violation>;
}

/// Outcome of one standard for one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardFinding {
    pub standard: Standard,
    pub applicable: bool,
    pub violations: Vec<Violation>,
}

impl StandardFinding {
    /// Applicable and free of violations.
    pub fn passed(&self) -> bool {
        self.applicable && self.violations.is_empty()
    }
}

/// Run one check, skipping it when not applicable.
pub fn run_check(check: &dyn StandardCheck, ctx: &ValidationContext<'_>) -> StandardFinding {
    let applicable = check.is_applicable(ctx);
    let violations = if applicable { check.check(ctx) } else { Vec::new() };

    StandardFinding {
        standard: check.standard(),
        applicable,
        violations,
    }
}

/// Run all five standards in order.
pub fn run_all(ctx: &ValidationContext<'_>) -> Vec<StandardFinding> {
    let checks: [&dyn StandardCheck; 5] = [
        &LiteratureReviewCheck::new(),
        &SourceHierarchyCheck::new(),
        &UncertaintyDisclosureCheck::new(),
        &DissentLabelingCheck::new(),
        &TherapeuticScopeCheck::new(),
    ];

    checks.iter().map(|check| run_check(*check, ctx)).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::classifier::SourceClassifier;
    use crate::intent::IntentDetector;
    use crate::registry::SourceRegistry;

    /// Owns the inputs a `ValidationContext` borrows.
    pub struct Fixture {
        pub response: String,
        pub query: String,
        pub sources: Vec<Source>,
        pub intent: IntentResult,
        pub required_confidence: ConfidenceLevel,
        pub lexicons: Lexicons,
    }

    impl Fixture {
        pub fn new(response: &str, query: &str, urls: &[&str]) -> Self {
            let lexicons = Lexicons::default();
            let registry = SourceRegistry::default();
            let sources: Vec<Source> = urls
                .iter()
                .map(|u| SourceClassifier::new(&registry).classify(u))
                .collect();
            let tiers: Vec<_> = sources.iter().map(|s| s.tier).collect();
            let intent = IntentDetector::new(&lexicons).detect(query, response);

            Self {
                response: response.to_string(),
                query: query.to_string(),
                required_confidence: crate::confidence::ConfidenceCalibrator::calibrate(&tiers),
                sources,
                intent,
                lexicons,
            }
        }

        pub fn ctx(&self) -> ValidationContext<'_> {
            ValidationContext {
                response: &self.response,
                query: &self.query,
                sources: &self.sources,
                intent: &self.intent,
                required_confidence: self.required_confidence,
                lexicons: &self.lexicons,
            }
        }
    }
}
