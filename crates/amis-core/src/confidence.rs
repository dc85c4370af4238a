//! Confidence calibration.
//!
//! Maps the tiers supporting a response to the strongest confidence level
//! its language may carry, then checks the response text against that level.
//!
//! | Evidence | Required level |
//! |----------|----------------|
//! | Tier 1 and at least two sources at Tier 1-2 | Definitive |
//! | Best tier 1 or 2 | QualifiedDefinitive |
//! | Best tier 3, corroborated by another Tier 1-3 source | Qualified |
//! | Best tier 3 alone, or best tier 4 | Uncertain |
//! | Only Tier 5, or nothing | Speculative |

use crate::evidence::EvidenceSpan;
use crate::lexicon::Lexicons;
use crate::types::{ConfidenceLevel, Severity, Standard, Tier, Violation, ViolationType};

/// Computes required confidence and checks language against it.
pub struct ConfidenceCalibrator<'a> {
    lexicons: &'a Lexicons,
}

impl<'a> ConfidenceCalibrator<'a> {
    pub fn new(lexicons: &'a Lexicons) -> Self {
        Self { lexicons }
    }

    /// Required confidence for a claim supported by sources of these tiers,
    /// one entry per source. Tier 5 sources contribute nothing.
    pub fn calibrate(tiers: &[Tier]) -> ConfidenceLevel {
        let permitted: Vec<Tier> = tiers.iter().copied().filter(|t| t.is_permitted()).collect();
        let count_at_or_above = |tier: Tier| permitted.iter().filter(|t| **t <= tier).count();

        let Some(best) = permitted.iter().copied().min() else {
            return ConfidenceLevel::Speculative;
        };

        match best {
            Tier::PrimaryAuthority if count_at_or_above(Tier::HighQualityEvidence) >= 2 => {
                ConfidenceLevel::Definitive
            }
            Tier::PrimaryAuthority | Tier::HighQualityEvidence => {
                ConfidenceLevel::QualifiedDefinitive
            }
            Tier::SupportingEvidence if count_at_or_above(Tier::SupportingEvidence) >= 2 => {
                ConfidenceLevel::Qualified
            }
            Tier::SupportingEvidence | Tier::ExpertOpinion => ConfidenceLevel::Uncertain,
            Tier::Excluded => ConfidenceLevel::Speculative,
        }
    }

    /// Standard 3 violations for `response` at the `required` level.
    ///
    /// Only Uncertain and Speculative levels constrain language: each
    /// overconfidence marker occurrence is a violation, and a missing
    /// uncertainty warning is a critical one.
    pub fn check_language(&self, response: &str, required: ConfidenceLevel) -> Vec<Violation> {
        if !required.requires_warning() {
            return Vec::new();
        }

        let severity = if required == ConfidenceLevel::Speculative {
            Severity::High
        } else {
            Severity::Medium
        };

        let mut violations: Vec<Violation> = self
            .lexicons
            .overconfidence
            .find_all(response)
            .into_iter()
            .map(|m| {
                Violation::new(
                    Standard::UncertaintyDisclosure,
                    ViolationType::OverconfidentLanguage,
                    severity,
                    format!(
                        "Overconfident language '{}' where evidence supports only {} claims",
                        m.text,
                        required.as_str()
                    ),
                )
                .with_evidence(EvidenceSpan::response(m.start, m.end, m.text))
            })
            .collect();

        if !self.lexicons.uncertainty_warnings.is_match(response) {
            violations.push(Violation::new(
                Standard::UncertaintyDisclosure,
                ViolationType::MissingUncertaintyWarning,
                Severity::Critical,
                format!(
                    "Evidence supports only {} claims but the response carries no uncertainty warning",
                    required.as_str()
                ),
            ));
        }

        violations
    }
}
