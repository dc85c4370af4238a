//! Standard 2: Source Hierarchy
//!
//! **Question**: Are the cited sources permitted and of adequate tier?
//!
//! Every Tier 5 source, cited or embedded, is a critical violation of its
//! own. Sources that are all below Tier 2 are a medium violation.

use super::{StandardCheck, ValidationContext};
use crate::evidence::EvidenceSpan;
use crate::types::{Severity, Source, SourceOrigin, Standard, Violation, ViolationType};

/// The Source Hierarchy check.
pub struct SourceHierarchyCheck;

impl SourceHierarchyCheck {
    pub fn new() -> Self {
        Self
    }

    /// Where the excluded source appears: its index in the supplied list,
    /// or its position in the response for embedded mentions.
    fn evidence_for(index: usize, source: &Source, response: &str) -> Option<EvidenceSpan> {
        match source.origin {
            SourceOrigin::Cited => Some(EvidenceSpan::cited_source(index, source.url.clone())),
            SourceOrigin::Embedded => response
                .find(&source.url)
                .map(|start| EvidenceSpan::response(start, start + source.url.len(), source.url.clone())),
        }
    }
}

impl Default for SourceHierarchyCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardCheck for SourceHierarchyCheck {
    fn standard(&self) -> Standard {
        Standard::SourceHierarchy
    }

    fn is_applicable(&self, _ctx: &ValidationContext<'_>) -> bool {
        true
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Violation> {
        let mut violations = Vec::new();

        // Cited sources come first in ctx.sources, so their positions match
        // the caller's list.
        for (index, source) in ctx.sources.iter().enumerate() {
            if source.permitted {
                continue;
            }

            let origin = match source.origin {
                SourceOrigin::Cited => "Cited",
                SourceOrigin::Embedded => "Referenced",
            };
            let mut violation = Violation::new(
                self.standard(),
                ViolationType::Tier5Source,
                Severity::Critical,
                format!(
                    "{} source '{}' is a Tier 5 platform ({}) and may not support medical claims",
                    origin,
                    source.normalized_domain,
                    source.matched_entry.as_deref().unwrap_or("excluded platform")
                ),
            );
            if let Some(evidence) = Self::evidence_for(index, source, ctx.response) {
                violation = violation.with_evidence(evidence);
            }
            violations.push(violation);
        }

        let has_high_tier = ctx.sources.iter().any(|s| s.tier.is_authoritative());
        if !ctx.sources.is_empty() && !has_high_tier {
            violations.push(Violation::new(
                self.standard(),
                ViolationType::NoHighTierSources,
                Severity::Medium,
                "No Tier 1-2 source supports the response",
            ));
        }

        violations
    }
}
