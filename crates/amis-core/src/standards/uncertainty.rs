//! Standard 3: Uncertainty Disclosure
//!
//! **Question**: Does the language match the strength of the evidence?
//!
//! Delegates to [`ConfidenceCalibrator::check_language`] with the level
//! computed from the response's sources.

use super::{StandardCheck, ValidationContext};
use crate::confidence::ConfidenceCalibrator;
use crate::types::{Standard, Violation};

/// The Uncertainty Disclosure check.
pub struct UncertaintyDisclosureCheck;

impl UncertaintyDisclosureCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UncertaintyDisclosureCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardCheck for UncertaintyDisclosureCheck {
    fn standard(&self) -> Standard {
        Standard::UncertaintyDisclosure
    }

    fn is_applicable(&self, ctx: &ValidationContext<'_>) -> bool {
        !ctx.response.trim().is_empty()
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Violation> {
        ConfidenceCalibrator::new(ctx.lexicons).check_language(ctx.response, ctx.required_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standards::test_support::Fixture;
    use crate::types::{ConfidenceLevel, ViolationType};

    #[test]
    fn test_single_tier_three_source_constrains_language() {
        let fixture = Fixture::new(
            "This remedy is proven to work. Evidence is limited.",
            "",
            &["mayoclinic.org"],
        );
        assert_eq!(fixture.required_confidence, ConfidenceLevel::Uncertain);

        let violations = UncertaintyDisclosureCheck::new().check(&fixture.ctx());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type, ViolationType::OverconfidentLanguage);
    }

    #[test]
    fn test_tier_one_support_allows_confident_language() {
        let fixture = Fixture::new(
            "Smoking definitely increases lung cancer risk.",
            "",
            &["who.int", "https://www.cochranelibrary.com/cdsr/1"],
        );
        assert_eq!(fixture.required_confidence, ConfidenceLevel::Definitive);
        assert!(UncertaintyDisclosureCheck::new().check(&fixture.ctx()).is_empty());
    }
}
