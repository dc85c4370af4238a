//! Standard 4: Dissent Labeling
//!
//! **Question**: Is dissent acknowledged without false certainty?
//!
//! Topics on the controversy list have asymmetric or contested evidence. A
//! response touching one must say so. Dogmatic phrasing is flagged on any
//! topic.

use super::{StandardCheck, ValidationContext};
use crate::evidence::EvidenceSpan;
use crate::types::{Severity, Standard, Violation, ViolationType};

/// The Dissent Labeling check.
pub struct DissentLabelingCheck;

impl DissentLabelingCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DissentLabelingCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardCheck for DissentLabelingCheck {
    fn standard(&self) -> Standard {
        Standard::DissentLabeling
    }

    fn is_applicable(&self, ctx: &ValidationContext<'_>) -> bool {
        !ctx.response.trim().is_empty()
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Violation> {
        let lexicons = ctx.lexicons;
        let mut violations = Vec::new();

        let topic = lexicons
            .controversy_topics
            .first_match(ctx.response)
            .map(|m| (m.phrase, EvidenceSpan::response(m.start, m.end, m.text)))
            .or_else(|| {
                lexicons
                    .controversy_topics
                    .first_match(ctx.query)
                    .map(|m| (m.phrase, EvidenceSpan::query(m.start, m.end, m.text)))
            });

        if let Some((phrase, evidence)) = topic {
            if !lexicons.dissent_markers.is_match(ctx.response) {
                violations.push(
                    Violation::new(
                        self.standard(),
                        ViolationType::UnlabeledDissent,
                        Severity::High,
                        format!(
                            "'{}' is a contested topic but the response does not acknowledge dissent or the state of consensus",
                            phrase
                        ),
                    )
                    .with_evidence(evidence),
                );
            }
        }

        for m in lexicons.dogmatic.find_all(ctx.response) {
            violations.push(
                Violation::new(
                    self.standard(),
                    ViolationType::DogmaticLanguage,
                    Severity::Medium,
                    format!("Dogmatic language '{}' forecloses legitimate disagreement", m.text),
                )
                .with_evidence(EvidenceSpan::response(m.start, m.end, m.text)),
            );
        }

        violations
    }
}
