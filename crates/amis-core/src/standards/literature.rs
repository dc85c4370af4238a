//! Standard 1: Literature Review
//!
//! **Question**: Does the response rest on appraised literature?
//!
//! | Condition | Violation |
//! |-----------|-----------|
//! | No cited or embedded source | `no_sources` (High) |
//! | Long response with no evidence-appraisal language | `no_evidence_appraisal` (Medium) |

use super::{StandardCheck, ValidationContext};
use crate::types::{Severity, Standard, Violation, ViolationType};

/// Responses longer than this are expected to appraise their evidence.
const APPRAISAL_EXPECTED_CHARS: usize = 500;

/// The Literature Review check.
pub struct LiteratureReviewCheck;

impl LiteratureReviewCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LiteratureReviewCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardCheck for LiteratureReviewCheck {
    fn standard(&self) -> Standard {
        Standard::LiteratureReview
    }

    fn is_applicable(&self, ctx: &ValidationContext<'_>) -> bool {
        !ctx.response.trim().is_empty()
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Violation> {
        let mut violations = Vec::new();

        if ctx.sources.is_empty() {
            violations.push(Violation::new(
                self.standard(),
                ViolationType::NoSources,
                Severity::High,
                "Medical claims are made without citing any source",
            ));
        }

        if ctx.response.chars().count() > APPRAISAL_EXPECTED_CHARS
            && !ctx.lexicons.evidence_appraisal.is_match(ctx.response)
        {
            violations.push(Violation::new(
                self.standard(),
                ViolationType::NoEvidenceAppraisal,
                Severity::Medium,
                "Response does not indicate the quality or design of the underlying evidence",
            ));
        }

        violations
    }
}
