//! Compliance validator: runs every component and aggregates the verdict.
//!
//! The aggregation rules are fixed:
//! 1. Any Critical violation → not compliant
//! 2. Harm action Block → not compliant
//! 3. Any violation at all → not compliant
//!
//! The score is the share of applicable standards that produced no
//! violation. It is informative only and never overrides rules 1-3.

use serde::Serialize;
use std::collections::HashSet;

use crate::classifier::{SourceClassifier, SourceMix};
use crate::confidence::ConfidenceCalibrator;
use crate::config::{EngineConfig, OversizePolicy};
use crate::harm::{HarmCascade, HarmCascadeAnalyzer, HarmContext, RiskFactor};
use crate::intent::IntentDetector;
use crate::standards::{self, StandardFinding, ValidationContext};
use crate::types::{
    ComplianceResult, ConfidenceLevel, HarmAction, HarmAssessment, InputField, InputNote,
    IntentResult, NoteKind, Severity, SourceRef, Tier, Violation, ViolationType,
};

/// Recommendation when nothing needs to change.
pub const COMPLIANT_RECOMMENDATION: &str = "Response meets compliance requirements.";

/// One recommendation per violation type, in the order they are reported.
const VIOLATION_RECOMMENDATIONS: &[(ViolationType, &str)] = &[
    (ViolationType::Tier5Source, "Remove Tier 5 sources (social media, video and forum platforms)."),
    (ViolationType::NoHighTierSources, "Add Tier 1-2 sources (systematic reviews, guidelines, major journals)."),
    (ViolationType::OverconfidentLanguage, "Calibrate language to the strength of the evidence."),
    (ViolationType::MissingUncertaintyWarning, "Add an explicit uncertainty warning."),
    (ViolationType::MissingPhysicianReferral, "Add a referral to a physician for treatment decisions."),
    (ViolationType::SpecificDosingProvided, "Remove specific dosing; dosing must come from a physician."),
    (ViolationType::RedFlagNoEmergencyReferral, "Direct the user to emergency services immediately."),
    (ViolationType::UnlabeledDissent, "Acknowledge dissenting views and the state of consensus."),
    (ViolationType::DogmaticLanguage, "Remove dogmatic language that forecloses disagreement."),
    (ViolationType::NoSources, "Cite the sources that support the response."),
    (ViolationType::NoEvidenceAppraisal, "Describe the quality and design of the underlying evidence."),
];

const BLOCK_RECOMMENDATION: &str =
    "Withhold or regenerate the response: harm assessment requires blocking.";
const WARN_RECOMMENDATION: &str = "Insert or strengthen warnings before returning the response.";
const RESUBMIT_RECOMMENDATION: &str = "Resubmit with input within the configured size limit.";

/// Everything computed for one validation, beyond the verdict itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub result: ComplianceResult,
    pub required_confidence: ConfidenceLevel,
    pub intent: IntentResult,
    pub findings: Vec<StandardFinding>,
    pub harm_factors: Vec<RiskFactor>,
}

/// Validates candidate responses against one configuration.
#[derive(Debug, Clone, Default)]
pub struct ComplianceValidator {
    config: EngineConfig,
}

impl ComplianceValidator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a response. Never fails: input problems are reported as
    /// notes inside the result.
    pub fn validate(&self, response: &str, query: &str, sources: &[SourceRef]) -> ComplianceResult {
        self.evaluate(response, query, sources).result
    }

    /// Validate and keep the intermediate findings.
    pub fn evaluate(&self, response: &str, query: &str, sources: &[SourceRef]) -> ValidationReport {
        let limits = self.config.input_limits;
        let mut notes = Vec::new();

        let response = self.limit(response, InputField::Response, &mut notes);
        let query = self.limit(query, InputField::Query, &mut notes);

        if !notes.is_empty() && limits.oversize == OversizePolicy::Reject {
            return Self::rejected(notes);
        }

        // Classify cited sources, then any the response mentions itself
        let classifier = SourceClassifier::new(&self.config.registry);
        let mut classified = classifier.classify_all(sources);
        let cited_domains: HashSet<String> = classified
            .iter()
            .map(|s| s.normalized_domain.clone())
            .collect();
        classified.extend(classifier.classify_embedded(response, &cited_domains));

        let intent = IntentDetector::new(&self.config.lexicons).detect(query, response);

        let tiers: Vec<Tier> = classified.iter().map(|s| s.tier).collect();
        let required_confidence = ConfidenceCalibrator::calibrate(&tiers);

        let ctx = ValidationContext {
            response,
            query,
            sources: &classified,
            intent: &intent,
            required_confidence,
            lexicons: &self.config.lexicons,
        };
        let findings = standards::run_all(&ctx);

        let harm_context = HarmContext {
            authoritative_citation: classified
                .iter()
                .any(|s| s.permitted && s.tier.is_authoritative())
                || self.config.lexicons.authoritative_citations.is_match(response),
        };
        let harm = HarmCascadeAnalyzer::new(&self.config.lexicons, &self.config.harm_thresholds)
            .analyze_with(response, query, &harm_context);

        let violations: Vec<Violation> = findings
            .iter()
            .flat_map(|f| f.violations.iter().cloned())
            .collect();

        let applicable = findings.iter().filter(|f| f.applicable).count();
        let passed = findings.iter().filter(|f| f.passed()).count();
        let score = if applicable == 0 {
            1.0
        } else {
            passed as f64 / applicable as f64
        };

        let has_critical = violations.iter().any(Violation::is_critical);
        let compliant =
            passed == applicable && !has_critical && harm.assessment.action != HarmAction::Block;

        let recommendations = recommendations(&violations, &harm, &SourceMix::from_sources(&classified));

        tracing::debug!(
            sources = classified.len(),
            violations = violations.len(),
            score,
            compliant,
            confidence = required_confidence.as_str(),
            action = ?harm.assessment.action,
            "Validated response"
        );

        ValidationReport {
            result: ComplianceResult {
                compliant,
                score,
                violations,
                harm_assessment: harm.assessment,
                source_classifications: classified,
                recommendations,
                notes,
            },
            required_confidence,
            intent,
            findings,
            harm_factors: harm.factors,
        }
    }

    /// Apply the size limit to one input, recording a note when it is exceeded.
    fn limit<'t>(&self, text: &'t str, field: InputField, notes: &mut Vec<InputNote>) -> &'t str {
        let limits = self.config.input_limits;
        if text.len() <= limits.max_bytes {
            return text;
        }

        let action = match limits.oversize {
            OversizePolicy::Truncate => "truncated",
            OversizePolicy::Reject => "rejected",
        };
        tracing::warn!(
            field = ?field,
            bytes = text.len(),
            max_bytes = limits.max_bytes,
            "Input exceeds size limit, {}",
            action
        );

        notes.push(InputNote {
            kind: NoteKind::InputTooLarge,
            severity: Severity::Medium,
            field,
            message: format!(
                "Input of {} bytes exceeds the {} byte limit and was {}",
                text.len(),
                limits.max_bytes,
                action
            ),
        });

        truncate_at_char_boundary(text, limits.max_bytes)
    }

    fn rejected(notes: Vec<InputNote>) -> ValidationReport {
        ValidationReport {
            result: ComplianceResult {
                compliant: false,
                score: 0.0,
                violations: Vec::new(),
                harm_assessment: HarmAssessment::clear(),
                source_classifications: Vec::new(),
                recommendations: vec![RESUBMIT_RECOMMENDATION.to_string()],
                notes,
            },
            required_confidence: ConfidenceLevel::Speculative,
            intent: IntentResult::default(),
            findings: Vec::new(),
            harm_factors: Vec::new(),
        }
    }
}

/// Longest prefix of `text` within `max_bytes` that ends on a char boundary.
fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Violation advice, then harm mitigations, then source-mix notes, then the
/// harm action line. Duplicates are dropped.
fn recommendations(violations: &[Violation], harm: &HarmCascade, mix: &SourceMix) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    for (violation_type, advice) in VIOLATION_RECOMMENDATIONS {
        if violations.iter().any(|v| v.violation_type == *violation_type) {
            push_unique(&mut out, advice);
        }
    }

    for mitigation in harm.mitigations() {
        push_unique(&mut out, mitigation);
    }

    for note in &mix.notes {
        push_unique(&mut out, note);
    }

    match harm.assessment.action {
        HarmAction::Block => push_unique(&mut out, BLOCK_RECOMMENDATION),
        HarmAction::Warn => push_unique(&mut out, WARN_RECOMMENDATION),
        HarmAction::Pass => {}
    }

    if out.is_empty() {
        out.push(COMPLIANT_RECOMMENDATION.to_string());
    }

    out
}

fn push_unique(out: &mut Vec<String>, text: &str) {
    if !out.iter().any(|r| r == text) {
        out.push(text.to_string());
    }
}
